use std::collections::HashSet;
use std::rc::Rc;
use crate::errors::StorageError;
use crate::models::question::{Question, QuestionFilter};
use crate::services::storage::{load_json, save_json, KeyValueStore};
use crate::utils::constants::QUESTION_BANK_KEY;

/// Banco de questões consumido por las vistas periféricas.
/// Sin contrato transaccional: los contadores son eventualmente consistentes.
pub trait QuestionStore {
    fn count(&self) -> Result<usize, StorageError>;
    fn count_by_subject(&self, subject: &str) -> Result<usize, StorageError>;
    fn query(&self, filter: &QuestionFilter) -> Result<Vec<Question>, StorageError>;
    /// Importar en bloque; devuelve cuántas eran nuevas
    fn bulk_import(&self, questions: Vec<Question>) -> Result<usize, StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Banco completo como un único documento JSON en el storage
#[derive(Clone)]
pub struct LocalQuestionStore {
    store: Rc<dyn KeyValueStore>,
}

impl LocalQuestionStore {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn load_all(&self) -> Result<Vec<Question>, StorageError> {
        Ok(load_json(self.store.as_ref(), QUESTION_BANK_KEY)?.unwrap_or_default())
    }
}

impl QuestionStore for LocalQuestionStore {
    fn count(&self) -> Result<usize, StorageError> {
        Ok(self.load_all()?.len())
    }

    fn count_by_subject(&self, subject: &str) -> Result<usize, StorageError> {
        let filter = QuestionFilter {
            subject: Some(subject.to_string()),
            ..QuestionFilter::default()
        };
        Ok(self.load_all()?.iter().filter(|q| filter.matches(q)).count())
    }

    fn query(&self, filter: &QuestionFilter) -> Result<Vec<Question>, StorageError> {
        let matching = self.load_all()?.into_iter().filter(|q| filter.matches(q));
        Ok(match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    fn bulk_import(&self, questions: Vec<Question>) -> Result<usize, StorageError> {
        let mut bank = self.load_all()?;
        let mut known: HashSet<String> = bank.iter().map(|q| q.id.clone()).collect();

        let before = bank.len();
        for question in questions {
            if known.insert(question.id.clone()) {
                bank.push(question);
            }
        }
        let imported = bank.len() - before;

        save_json(self.store.as_ref(), QUESTION_BANK_KEY, &bank)?;
        log::info!("📚 [QUESTOES] {} questões importadas ({} no total)", imported, bank.len());
        Ok(imported)
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.store.remove_item(QUESTION_BANK_KEY)
    }
}
