// ============================================================================
// MÓDULO DE INTERNACIONALIZACIÓN
// ============================================================================

use std::collections::HashMap;

/// Obtener diccionario de traducciones para un idioma
fn get_translations(lang: &str) -> HashMap<&'static str, &'static str> {
    let mut translations = HashMap::new();
    let lang_upper = lang.to_uppercase();

    match lang_upper.as_str() {
        "EN" => {
            translations.insert("offline", "You are offline");
            translations.insert("offline_pending", "You are offline ({n} pending)");
            translations.insert("pending", "Pending ({n})");
            translations.insert("syncing", "Syncing...");
            translations.insert("synced", "Synced");
            translations.insert("mentor", "Mentor");
            translations.insert("voce", "You");
            translations.insert("digitando", "typing...");
        }
        _ => {
            // Portugués (por defecto)
            translations.insert("offline", "Você está offline");
            translations.insert("offline_pending", "Você está offline ({n} pendentes)");
            translations.insert("pending", "Pendentes ({n})");
            translations.insert("syncing", "Sincronizando...");
            translations.insert("synced", "Sincronizado");
            translations.insert("mentor", "Mentor");
            translations.insert("voce", "Você");
            translations.insert("digitando", "digitando...");
        }
    }

    translations
}

/// Obtener traducción; si la clave no existe devuelve la clave
pub fn t(key: &str, lang: &str) -> String {
    get_translations(lang)
        .get(key)
        .map(|s| s.to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Traducción con contador `{n}`
pub fn t_count(key: &str, lang: &str, n: usize) -> String {
    t(key, lang).replace("{n}", &n.to_string())
}
