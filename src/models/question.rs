use serde::{Deserialize, Serialize};

/// Pregunta del banco de questões
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub subject: String,
    #[serde(default)]
    pub board: Option<String>,
    pub stem: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

/// Filtro de consulta; los campos vacíos no filtran
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionFilter {
    pub subject: Option<String>,
    pub board: Option<String>,
    pub limit: Option<usize>,
}

impl QuestionFilter {
    pub fn matches(&self, question: &Question) -> bool {
        let subject_ok = self
            .subject
            .as_ref()
            .map_or(true, |s| question.subject.eq_ignore_ascii_case(s));
        let board_ok = self.board.as_ref().map_or(true, |b| {
            question
                .board
                .as_ref()
                .map_or(false, |qb| qb.eq_ignore_ascii_case(b))
        });
        subject_ok && board_ok
    }
}
