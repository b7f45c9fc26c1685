//! Pure string->string formatters: name-key normalization and soundex. The specification treats
//! date and place formatting as external collaborators with a narrow contract (format in, string
//! out); this module supplies the minimal implementations this crate needs to run end to end,
//! without growing into a full calendar or gazetteer system.

/// Normalizes a raw GEDCOM name value (`"Given /Surname/"`) into a surname-first canonical name
/// key: lowercase, diacritic-folded to ASCII, surname first, whitespace-collapsed.
pub fn name_to_name_key(raw: &str) -> String {
    let (given, surname) = split_name(raw);
    let mut key = String::new();
    key.push_str(&fold(surname));
    key.push(' ');
    key.push_str(&fold(given));
    key.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits `"Given /Surname/"` into `(given, surname)`. Missing slashes yield an empty surname.
pub fn split_name(raw: &str) -> (&str, &str) {
    if let Some(start) = raw.find('/') {
        let rest = &raw[start + 1..];
        let end = rest.find('/').unwrap_or(rest.len());
        (raw[..start].trim(), rest[..end].trim())
    } else {
        (raw.trim(), "")
    }
}

/// Folds a string to lowercase ASCII, stripping common Latin-1 diacritics and punctuation.
fn fold(s: &str) -> String {
    s.chars()
        .filter_map(|c| {
            let lower = c.to_ascii_lowercase();
            let folded = match lower {
                'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
                'è' | 'é' | 'ê' | 'ë' => 'e',
                'ì' | 'í' | 'î' | 'ï' => 'i',
                'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
                'ù' | 'ú' | 'û' | 'ü' => 'u',
                'ñ' => 'n',
                'ç' => 'c',
                other => other,
            };
            if folded.is_alphanumeric() || folded.is_whitespace() {
                Some(folded)
            } else if folded == '-' {
                Some(' ')
            } else {
                None
            }
        })
        .collect()
}

/// American Soundex: one letter plus three digits.
pub fn soundex(name: &str) -> String {
    let letters: Vec<char> = name.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    if letters.is_empty() {
        return "0000".to_string();
    }
    let code = |c: char| -> Option<u8> {
        match c.to_ascii_uppercase() {
            'B' | 'F' | 'P' | 'V' => Some(1),
            'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => Some(2),
            'D' | 'T' => Some(3),
            'L' => Some(4),
            'M' | 'N' => Some(5),
            'R' => Some(6),
            _ => None,
        }
    };
    let mut out = String::new();
    out.push(letters[0].to_ascii_uppercase());
    let mut last = code(letters[0]);
    for &c in &letters[1..] {
        // H and W are transparent: they neither separate nor reset the duplicate-code check.
        if matches!(c.to_ascii_uppercase(), 'H' | 'W') {
            continue;
        }
        let cur = code(c);
        if let Some(d) = cur {
            if cur != last {
                out.push((b'0' + d) as char);
                if out.len() == 4 {
                    break;
                }
            }
        }
        last = cur;
    }
    while out.len() < 4 {
        out.push('0');
    }
    out
}
