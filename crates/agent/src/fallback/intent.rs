use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Register,
    Update,
    Delete,
    DeleteAll,
    GetById,
    List,
    Unrecognized,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::DeleteAll => "delete_all",
            Self::GetById => "get_by_id",
            Self::List => "list",
            Self::Unrecognized => "unrecognized",
        }
    }
}

const REGISTER_WORDS: &[&str] = &["register", "create", "add", "سجل", "انشئ", "ضيف"];
const ID_TOKENS: &[&str] = &["id", "رقم"];
const UPDATE_WORDS: &[&str] = &["update", "change", "modify", "تعديل", "تحديث", "غير"];
const DELETE_WORDS: &[&str] = &["delete", "remove", "حذف", "مسح"];
const LOOKUP_WORDS: &[&str] = &["get", "user", "هات", "مستخدم"];
const LIST_WORDS: &[&str] = &["get", "list", "show", "هات", "اعرض", "قائمة"];
const ARABIC_DELETE_WORDS: &[&str] = &["حذف", "مسح", "امسح", "احذف"];
const ARABIC_ALL_WORDS: &[&str] = &["الكل", "كل", "الجميع", "جميع", "المستخدمين"];

/// Substring-keyword view of a lowercased prompt.
struct Keywords {
    text: String,
}

impl Keywords {
    fn new(prompt: &str) -> Self {
        Self { text: prompt.to_lowercase() }
    }

    fn any(&self, words: &[&str]) -> bool {
        words.iter().any(|word| self.text.contains(word))
    }

    fn has(&self, word: &str) -> bool {
        self.text.contains(word)
    }
}

/// Maps a prompt to exactly one intent. Rules are checked in a fixed order and
/// the first match wins, so a prompt carrying an id token and "all" resolves to
/// a single delete, never to delete-all.
pub fn classify(prompt: &str) -> Intent {
    let keywords = Keywords::new(prompt);
    let has_id = keywords.any(ID_TOKENS);

    if keywords.any(REGISTER_WORDS) {
        Intent::Register
    } else if has_id && keywords.any(UPDATE_WORDS) {
        Intent::Update
    } else if has_id && keywords.any(DELETE_WORDS) {
        Intent::Delete
    } else if has_id && keywords.any(LOOKUP_WORDS) {
        Intent::GetById
    } else if keywords.any(LIST_WORDS) {
        Intent::List
    } else if (keywords.has("delete") && keywords.has("all"))
        || (keywords.any(ARABIC_DELETE_WORDS) && keywords.any(ARABIC_ALL_WORDS))
    {
        Intent::DeleteAll
    } else {
        Intent::Unrecognized
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, Intent};

    #[test]
    fn classifies_single_intent_prompts() {
        let cases = [
            ("Register a user named Ali", Intent::Register),
            ("CREATE someone new", Intent::Register),
            ("سجل مستخدم جديد", Intent::Register),
            ("ضيف موظف", Intent::Register),
            ("update id 5 age is 40", Intent::Update),
            ("تحديث رقم 3 عمر 22", Intent::Update),
            ("remove id 9", Intent::Delete),
            ("احذف رقم 4", Intent::Delete),
            ("get user id 7", Intent::GetById),
            ("هات مستخدم رقم 2", Intent::GetById),
            ("list everyone", Intent::List),
            ("Show me the users", Intent::List),
            ("اعرض قائمة", Intent::List),
            ("delete all users", Intent::DeleteAll),
            ("احذف جميع المستخدمين", Intent::DeleteAll),
            ("امسح الكل", Intent::DeleteAll),
            ("what's the weather", Intent::Unrecognized),
            ("", Intent::Unrecognized),
        ];

        for (prompt, expected) in cases {
            assert_eq!(classify(prompt), expected, "prompt: {prompt}");
        }
    }

    #[test]
    fn overlapping_keywords_resolve_to_earliest_rule() {
        let cases = [
            // register beats everything
            ("add user id 5 then delete all", Intent::Register),
            ("create and list", Intent::Register),
            // update beats delete and lookup
            ("update id 2, or delete it", Intent::Update),
            // delete beats lookup and delete-all
            ("delete user id 3", Intent::Delete),
            ("delete all id 3", Intent::Delete),
            // lookup beats list
            ("get user id 8", Intent::GetById),
            // list beats delete-all
            ("show and delete all", Intent::List),
        ];

        for (prompt, expected) in cases {
            assert_eq!(classify(prompt), expected, "prompt: {prompt}");
        }
    }

    #[test]
    fn id_token_is_a_plain_substring() {
        // "valid" contains "id", so a delete word is enough for a single delete.
        assert_eq!(classify("remove the valid ones"), Intent::Delete);
        assert_eq!(classify("update name to Sara"), Intent::Unrecognized);
    }

    #[test]
    fn arabic_delete_all_requires_both_word_groups() {
        assert_eq!(classify("امسح"), Intent::Unrecognized);
        assert_eq!(classify("حذف المستخدمين"), Intent::DeleteAll);
    }
}
