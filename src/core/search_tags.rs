/*
 * Derives the lowercase search tags attached to each plugin descriptor from the
 * plugin's description, its declared component names (split on camel case) and
 * its declared operation names (split on underscores).
 */
use std::collections::BTreeSet;

/*
 * Splits an identifier on camel-case boundaries: a word is an optional capital
 * followed by lowercase letters, or a run of capitals that ends before another
 * capital-led word or at the end. Digits and other characters separate words.
 * `JsonPage` -> [json, page], `HTMLParser` -> [html, parser].
 */
pub fn split_camel_case(identifier: &str) -> Vec<String> {
    let chars: Vec<char> = identifier.chars().collect();
    let mut words = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_lowercase() {
            let start = i;
            while i < chars.len() && chars[i].is_lowercase() {
                i += 1;
            }
            words.push(chars[start..i].iter().collect::<String>());
        } else if c.is_uppercase() {
            let start = i;
            let mut end = i;
            while end < chars.len() && chars[end].is_uppercase() {
                end += 1;
            }
            let run = end - start;
            let followed_by_lower = end < chars.len() && chars[end].is_lowercase();
            if followed_by_lower && run > 1 {
                // The last capital starts the next word: "HTMLParser" -> "HTML" + "Parser".
                words.push(chars[start..end - 1].iter().collect::<String>());
                i = end - 1;
            } else if followed_by_lower {
                let mut word_end = end;
                while word_end < chars.len() && chars[word_end].is_lowercase() {
                    word_end += 1;
                }
                words.push(chars[start..word_end].iter().collect::<String>());
                i = word_end;
            } else {
                words.push(chars[start..end].iter().collect::<String>());
                i = end;
            }
        } else {
            i += 1;
        }
    }

    words.into_iter().map(|w| w.to_lowercase()).collect()
}

/*
 * Operation names starting with `_` are private and contribute nothing.
 */
pub fn split_operation_name(operation: &str) -> Vec<String> {
    if operation.starts_with('_') {
        return Vec::new();
    }
    operation
        .split('_')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/*
 * Unions all token sources, lowercases, drops tokens of one character or less
 * and de-duplicates. The result is sorted.
 */
pub fn derive_search_tags(
    description: &str,
    components: &[String],
    operations: &[String],
    keywords: &[String],
) -> Vec<String> {
    let mut tags = BTreeSet::new();
    tags.extend(description.split_whitespace().map(str::to_lowercase));
    for component in components {
        tags.extend(split_camel_case(component));
    }
    for operation in operations {
        tags.extend(split_operation_name(operation));
    }
    for keyword in keywords {
        let keyword = keyword.trim();
        if keyword.contains('_') {
            tags.extend(split_operation_name(keyword));
        } else if keyword.chars().any(char::is_uppercase) {
            tags.extend(split_camel_case(keyword));
        } else {
            tags.insert(keyword.to_lowercase());
        }
    }
    tags.into_iter()
        .filter(|tag| tag.chars().count() > 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_camel_case() {
        assert_eq!(split_camel_case("JsonPage"), strings(&["json", "page"]));
        assert_eq!(split_camel_case("HTMLParser"), strings(&["html", "parser"]));
        assert_eq!(split_camel_case("ToolXY"), strings(&["tool", "xy"]));
        assert_eq!(split_camel_case("colorWheel2D"), strings(&["color", "wheel", "d"]));
        assert_eq!(split_camel_case(""), Vec::<String>::new());
    }

    #[test]
    fn test_split_operation_name() {
        assert_eq!(split_operation_name("convert_to_excel"), strings(&["convert", "to", "excel"]));
        assert!(split_operation_name("_private_helper").is_empty());
        assert_eq!(split_operation_name("run"), strings(&["run"]));
    }

    #[test]
    fn test_derive_search_tags_filters_and_dedups() {
        // Arrange
        let description = "JSON to Excel converter a";
        let components = strings(&["JsonPage", "ExcelPage"]);
        let operations = strings(&["convert_file", "_hidden", "open_page"]);
        let keywords = strings(&["SQL", "batch_export", "x"]);

        // Act
        let tags = derive_search_tags(description, &components, &operations, &keywords);

        // Assert
        assert_eq!(
            tags,
            strings(&[
                "batch", "convert", "converter", "excel", "export", "file", "json", "open", "page",
                "sql", "to"
            ])
        );
    }
}
