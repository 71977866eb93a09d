//! Spanish text normalization shared by the keyword classifier and matcher.

/// Lowercases and removes Spanish diacritics. Spanish text keeps its char count.
pub fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|character| match character {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

const STOPWORDS: &[&str] = &[
    "de", "del", "la", "el", "los", "las", "un", "una", "con", "para", "por", "en", "al", "que",
    "hay", "tienen", "tiene", "queda", "quedan", "stock", "disponible", "disponibles", "quiero",
    "necesito", "busco", "precio", "cotizar", "me", "mi",
];

/// Search tokens: folded, split on anything but letters, digits, `.` and `-`
/// (so SKUs like `1234.5678-9` survive), with `20 hp` merged into `20hp`.
pub fn tokenize(text: &str) -> Vec<String> {
    let folded = fold(text);
    let mut sanitized = String::with_capacity(folded.len());
    for character in folded.chars() {
        if character.is_alphanumeric() || matches!(character, '.' | '-') {
            sanitized.push(character);
        } else {
            sanitized.push(' ');
        }
    }

    let raw: Vec<&str> = sanitized
        .split_whitespace()
        .map(|token| token.trim_matches(|c| c == '.' || c == '-'))
        .filter(|token| !token.is_empty())
        .collect();

    let mut tokens = Vec::with_capacity(raw.len());
    let mut index = 0;
    while index < raw.len() {
        let token = raw[index];
        let next = raw.get(index + 1).copied();
        if token.chars().all(|c| c.is_ascii_digit()) && next == Some("hp") {
            tokens.push(format!("{token}hp"));
            index += 2;
            continue;
        }
        tokens.push(token.to_owned());
        index += 1;
    }

    tokens
        .into_iter()
        .filter(|token| token.chars().count() >= 2 && !STOPWORDS.contains(&token.as_str()))
        .collect()
}

pub fn is_horsepower(token: &str) -> bool {
    token
        .strip_suffix("hp")
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::{fold, is_horsepower, tokenize};

    #[test]
    fn fold_keeps_char_count() {
        let text = "Dirección Teléfono Ñandú";
        assert_eq!(fold(text), "direccion telefono nandu");
        assert_eq!(fold(text).chars().count(), text.chars().count());
    }

    #[test]
    fn tokenize_merges_horsepower_and_keeps_skus() {
        assert_eq!(tokenize("¿Tienen compresor de 20 HP?"), vec!["compresor", "20hp"]);
        assert_eq!(tokenize("SKU 1234.5678-9."), vec!["sku", "1234.5678-9"]);
        assert_eq!(tokenize("tanque 100 litros"), vec!["tanque", "100", "litros"]);
    }

    #[test]
    fn horsepower_tokens_need_digits() {
        assert!(is_horsepower("20hp"));
        assert!(!is_horsepower("hp"));
        assert!(!is_horsepower("xhp"));
    }
}
