use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{AnswerOption, Question, TraditionDescriptor};

/// Static quiz data: question bank, weights, aliases, and tradition descriptors.
///
/// Loaded once at startup, either from the embedded defaults or from the
/// `quiz` section of the config file, and treated as read-only afterwards.
///
/// Example YAML:
/// ```yaml
/// quiz:
///   questions: [...]
///   weights: { 1: 3, 3: 2 }
///   aliases: { wicca: paganism }
///   traditions:
///     paganism: { name: "Modern Paganism", description: "...", practices: "...", core_beliefs: "..." }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct QuizConfig {
    pub questions: Vec<Question>,

    /// Question id -> importance multiplier. Missing ids weigh 1.
    #[serde(default)]
    pub weights: BTreeMap<u32, u32>,

    /// Alias key -> canonical key
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,

    /// Canonical key -> descriptor
    pub traditions: BTreeMap<String, TraditionDescriptor>,
}

impl QuizConfig {
    /// Weight for a question id, defaulting to 1
    pub fn weight(&self, question_id: u32) -> u32 {
        self.weights.get(&question_id).copied().unwrap_or(1)
    }

    pub fn question(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Attach reference notes to traditions, matched by key, alias, or
    /// display name (case-insensitive). Returns the entries that matched nothing.
    pub fn apply_references(&mut self, references: BTreeMap<String, String>) -> Vec<String> {
        let mut unmatched = Vec::new();

        for (tradition, notes) in references {
            let lowered = tradition.trim().to_lowercase();
            let key = super::normalize(&lowered, &self.aliases).to_string();
            let key = if self.traditions.contains_key(&key) {
                Some(key)
            } else {
                self.traditions
                    .iter()
                    .find(|(_, d)| d.name.eq_ignore_ascii_case(tradition.trim()))
                    .map(|(k, _)| k.clone())
            };

            match key.and_then(|k| self.traditions.get_mut(&k)) {
                Some(descriptor) => descriptor.common_curiosities = Some(notes),
                None => unmatched.push(tradition),
            }
        }

        unmatched
    }
}

fn question(id: u32, prompt: &str, options: &[(&str, &[(&str, u32)])]) -> Question {
    Question {
        id,
        prompt: prompt.to_string(),
        options: options
            .iter()
            .map(|(label, points)| AnswerOption {
                label: label.to_string(),
                points: points.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            })
            .collect(),
    }
}

fn tradition(
    name: &str,
    description: &str,
    practices: &str,
    core_beliefs: &str,
    common_curiosities: &str,
) -> TraditionDescriptor {
    TraditionDescriptor {
        name: name.to_string(),
        description: description.to_string(),
        practices: practices.to_string(),
        core_beliefs: core_beliefs.to_string(),
        common_curiosities: Some(common_curiosities.to_string()),
    }
}

fn default_questions() -> Vec<Question> {
    vec![
        question(
            1,
            "What is your view on the nature of the divine?",
            &[
                ("One supreme God who created everything", &[("christianity", 3), ("islam", 3), ("judaism", 3)]),
                ("Multiple gods and goddesses", &[("hinduism", 3), ("paganism", 3)]),
                ("A universal energy or force", &[("buddhism", 2), ("taoism", 3), ("new_age", 3)]),
                ("No divine being, focus on human potential", &[("humanism", 3), ("atheism", 3)]),
                ("Uncertain or unknowable", &[("agnosticism", 3)]),
            ],
        ),
        question(
            2,
            "How do you prefer to connect with spirituality?",
            &[
                ("Through organized worship and community", &[("christianity", 2), ("islam", 2), ("judaism", 2)]),
                ("Through personal meditation and reflection", &[("buddhism", 3), ("hinduism", 2), ("taoism", 2)]),
                ("Through nature and natural cycles", &[("paganism", 3), ("indigenous", 3)]),
                ("Through reason and philosophy", &[("humanism", 2), ("stoicism", 3)]),
                ("I don't feel the need for spiritual connection", &[("atheism", 3)]),
            ],
        ),
        question(
            3,
            "What is your belief about the afterlife?",
            &[
                ("Heaven or Hell based on faith/deeds", &[("christianity", 3), ("islam", 3)]),
                ("Reincarnation until enlightenment", &[("hinduism", 3), ("buddhism", 3)]),
                ("Ancestral realm or spiritual world", &[("indigenous", 2), ("paganism", 2)]),
                ("No afterlife, this life is all there is", &[("atheism", 3), ("humanism", 2)]),
                ("Unsure or open to possibilities", &[("agnosticism", 2), ("new_age", 2)]),
            ],
        ),
        question(
            4,
            "What guides your moral and ethical decisions?",
            &[
                ("Sacred texts and religious teachings", &[("christianity", 3), ("islam", 3), ("judaism", 3)]),
                ("Universal principles of compassion and mindfulness", &[("buddhism", 3), ("jainism", 3)]),
                ("Harmony with nature and balance", &[("taoism", 3), ("indigenous", 2)]),
                ("Reason, empathy, and human rights", &[("humanism", 3), ("secularism", 3)]),
                ("Personal intuition and inner wisdom", &[("new_age", 2), ("spiritualism", 3)]),
            ],
        ),
        question(
            5,
            "What role does ritual or practice play in your life?",
            &[
                ("Regular prayer and worship are essential", &[("islam", 3), ("christianity", 2), ("judaism", 2)]),
                ("Daily meditation or mindfulness practice", &[("buddhism", 3), ("hinduism", 2), ("zen", 3)]),
                ("Seasonal celebrations and ceremonies", &[("paganism", 3), ("wicca", 3)]),
                ("Minimal to no ritual, prefer intellectual engagement", &[("humanism", 2), ("deism", 2)]),
                ("Flexible, whatever feels meaningful to me", &[("new_age", 2), ("spiritual_not_religious", 3)]),
            ],
        ),
        question(
            6,
            "How do you view the relationship between humans and nature?",
            &[
                ("Humans are stewards of God's creation", &[("christianity", 2), ("islam", 2), ("judaism", 2)]),
                ("All life is interconnected and sacred", &[("buddhism", 2), ("hinduism", 2), ("jainism", 3)]),
                ("Nature itself is divine", &[("paganism", 3), ("pantheism", 3), ("indigenous", 3)]),
                ("Nature follows natural laws we can understand", &[("atheism", 2), ("humanism", 2)]),
                ("We should live in harmony with natural flow", &[("taoism", 3), ("shintoism", 2)]),
            ],
        ),
        question(
            7,
            "What is your view on suffering and its purpose?",
            &[
                ("A test of faith or part of God's plan", &[("christianity", 2), ("islam", 2)]),
                ("Result of attachment and desire", &[("buddhism", 3), ("stoicism", 2)]),
                ("Karma from past actions", &[("hinduism", 3), ("sikhism", 2)]),
                ("Random or result of natural causes", &[("atheism", 3), ("secular", 2)]),
                ("An opportunity for growth and learning", &[("new_age", 2), ("spiritualism", 2)]),
            ],
        ),
        question(
            8,
            "How important is community in your spiritual life?",
            &[
                ("Very important, prefer group worship", &[("christianity", 2), ("islam", 2), ("sikhism", 3)]),
                ("Somewhat important, but personal practice matters more", &[("buddhism", 2), ("hinduism", 2)]),
                ("Community of like-minded seekers", &[("paganism", 2), ("unitarian", 3)]),
                ("Not important, spirituality is personal", &[("spiritual_not_religious", 3), ("deism", 2)]),
                ("Prefer secular community over religious", &[("humanism", 2), ("atheism", 2)]),
            ],
        ),
    ]
}

fn default_traditions() -> BTreeMap<String, TraditionDescriptor> {
    BTreeMap::from([
        ("christianity".to_string(), tradition(
            "Christianity",
            "Faith in Jesus Christ emphasizing love, forgiveness, and salvation through grace.",
            "Prayer, Bible study, church, communion",
            "Trinity, salvation through Christ, eternal life",
            "Differences between denominations; what grace means; how prayer works in daily life",
        )),
        ("islam".to_string(), tradition(
            "Islam",
            "Submission to Allah through Prophet Muhammad's teachings and the Quran.",
            "Five daily prayers, Ramadan fasting, charity, Mecca pilgrimage",
            "One God (Allah), Muhammad as prophet, Day of Judgment",
            "The Five Pillars; Sunni and Shia traditions; what the Quran says about other faiths",
        )),
        ("buddhism".to_string(), tradition(
            "Buddhism",
            "Path to enlightenment through mindfulness and compassion.",
            "Meditation, mindfulness, Eightfold Path",
            "Four Noble Truths, impermanence, ending suffering",
            "Whether Buddhists worship a god; Theravada, Mahayana and Zen schools; how to start meditating",
        )),
        ("hinduism".to_string(), tradition(
            "Hinduism",
            "Ancient tradition embracing diverse paths to spiritual realization.",
            "Yoga, meditation, puja, festivals",
            "Dharma, karma, reincarnation, moksha, multiple paths",
            "How many gods Hindus worship; the meaning of karma; the role of yoga beyond exercise",
        )),
        ("judaism".to_string(), tradition(
            "Judaism",
            "Covenant with God through Torah and Jewish community.",
            "Shabbat, Torah study, prayer, kosher",
            "One God, Torah as divine law, ethical monotheism",
            "Orthodox, Conservative and Reform movements; keeping Shabbat; conversion",
        )),
        ("taoism".to_string(), tradition(
            "Taoism",
            "Living in harmony with the Tao - the natural order.",
            "Meditation, tai chi, wu wei, simplicity",
            "Yin-yang balance, harmony with nature",
            "What wu wei means in practice; the Tao Te Ching; philosophical versus religious Taoism",
        )),
        ("paganism".to_string(), tradition(
            "Modern Paganism",
            "Nature-based spirituality honoring seasonal cycles.",
            "Seasonal celebrations, rituals, nature work",
            "Nature as sacred, multiple deities",
            "The Wheel of the Year; Wicca and other paths; practising alone or in a group",
        )),
        ("humanism".to_string(), tradition(
            "Secular Humanism",
            "Ethics emphasizing human values and reason without supernatural beliefs.",
            "Critical thinking, ethical living, community service",
            "Human dignity, reason, science, secular ethics",
            "Finding meaning without religion; humanist ceremonies; ethics without scripture",
        )),
        ("atheism".to_string(), tradition(
            "Atheism",
            "Lack of belief in deities with naturalistic worldview.",
            "Evidence-based thinking, secular community",
            "No gods, natural explanations, this-life focus",
            "Atheism versus agnosticism; morality without gods; secular community groups",
        )),
        ("agnosticism".to_string(), tradition(
            "Agnosticism",
            "Divine existence is unknown or unknowable.",
            "Philosophical inquiry, ethical living",
            "Uncertainty about divine, questions over answers",
            "Living with uncertainty; agnostic theism; exploring traditions without committing",
        )),
        ("new_age".to_string(), tradition(
            "New Age Spirituality",
            "Eclectic approach emphasizing personal growth.",
            "Meditation, energy work, crystals, yoga",
            "Personal transformation, universal consciousness",
            "Where New Age ideas come from; energy healing; combining practices from many traditions",
        )),
        ("spiritual_not_religious".to_string(), tradition(
            "Spiritual But Not Religious",
            "Personal spirituality without organized religion.",
            "Personal practices, meditation, self-reflection",
            "Individual journey, authenticity, diverse wisdom",
            "Building a personal practice; finding community; borrowing from traditions respectfully",
        )),
        ("sikhism".to_string(), tradition(
            "Sikhism",
            "One God emphasizing service, equality, and meditation.",
            "Prayer, meditation, community service, 5 Ks",
            "One God, equality, honest living, sharing",
            "The meaning of the turban; langar community kitchens; the Guru Granth Sahib",
        )),
        ("indigenous".to_string(), tradition(
            "Indigenous Spirituality",
            "Traditional practices honoring ancestors and land.",
            "Ceremonies, storytelling, seasonal rituals",
            "Land connection, ancestor veneration, reciprocity",
            "Respecting closed practices; learning from communities; the role of elders",
        )),
    ])
}

fn default_aliases() -> BTreeMap<String, String> {
    [
        ("wicca", "paganism"),
        ("zen", "buddhism"),
        ("secular", "humanism"),
        ("secularism", "humanism"),
        ("spiritualism", "new_age"),
    ]
    .into_iter()
    .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
    .collect()
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            questions: default_questions(),
            // Beliefs about the divine, the afterlife and moral guidance say more
            // about fit than practice preferences do
            weights: BTreeMap::from([(1, 3), (3, 2), (4, 2)]),
            aliases: default_aliases(),
            traditions: default_traditions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bank_shape() {
        let quiz = QuizConfig::default();
        assert_eq!(quiz.questions.len(), 8);
        assert_eq!(quiz.traditions.len(), 14);
        assert!(quiz.questions.iter().all(|q| q.options.len() == 5));
    }

    #[test]
    fn test_weight_defaults_to_one() {
        let quiz = QuizConfig::default();
        assert_eq!(quiz.weight(1), 3);
        assert_eq!(quiz.weight(2), 1);
        assert_eq!(quiz.weight(999), 1);
    }

    #[test]
    fn test_question_lookup() {
        let quiz = QuizConfig::default();
        assert_eq!(
            quiz.question(3).map(|q| q.prompt.as_str()),
            Some("What is your belief about the afterlife?")
        );
        assert!(quiz.question(0).is_none());
    }

    #[test]
    fn test_default_aliases_target_known_traditions() {
        let quiz = QuizConfig::default();
        for canonical in quiz.aliases.values() {
            assert!(quiz.traditions.contains_key(canonical), "{}", canonical);
        }
    }

    #[test]
    fn test_quiz_config_yaml_roundtrip() {
        let quiz = QuizConfig::default();
        let yaml = serde_saphyr::to_string(&quiz).unwrap();
        let parsed: QuizConfig = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(quiz, parsed);
    }

    #[test]
    fn test_partial_quiz_config_parse() {
        let yaml = r#"
questions:
  - id: 1
    prompt: "Pick one"
    options:
      - label: "A"
        points: { buddhism: 3 }
      - label: "B"
        points: { christianity: 3 }
traditions:
  buddhism:
    name: Buddhism
    description: Path to enlightenment
    practices: Meditation
    core_beliefs: Four Noble Truths
"#;
        let quiz: QuizConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(quiz.questions.len(), 1);
        assert!(quiz.weights.is_empty());
        assert!(quiz.aliases.is_empty());
        assert!(quiz.traditions["buddhism"].common_curiosities.is_none());
        assert_eq!(quiz.questions[0].options[1].points["christianity"], 3);
    }

    #[test]
    fn test_apply_references() {
        let mut quiz = QuizConfig::default();
        let references = BTreeMap::from([
            ("buddhism".to_string(), "Is nirvana a place?".to_string()),
            ("HINDUISM".to_string(), "Why so many gods?".to_string()),
            ("Modern Paganism".to_string(), "Is it witchcraft?".to_string()),
            ("Jediism".to_string(), "Is it real?".to_string()),
        ]);

        let unmatched = quiz.apply_references(references);

        assert_eq!(unmatched, vec!["Jediism".to_string()]);
        assert_eq!(
            quiz.traditions["buddhism"].common_curiosities.as_deref(),
            Some("Is nirvana a place?")
        );
        assert_eq!(
            quiz.traditions["hinduism"].common_curiosities.as_deref(),
            Some("Why so many gods?")
        );
        let pagan = quiz
            .traditions
            .values()
            .find(|d| d.name == "Modern Paganism")
            .unwrap();
        assert_eq!(pagan.common_curiosities.as_deref(), Some("Is it witchcraft?"));
    }

    #[test]
    fn test_apply_references_through_alias() {
        let mut quiz = QuizConfig::default();
        let (alias, target) = quiz
            .aliases
            .iter()
            .next()
            .map(|(a, t)| (a.clone(), t.clone()))
            .unwrap();

        let unmatched = quiz.apply_references(BTreeMap::from([(alias, "Notes".to_string())]));

        assert!(unmatched.is_empty());
        assert_eq!(
            quiz.traditions[&target].common_curiosities.as_deref(),
            Some("Notes")
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = r#"
questions: []
traditions: {}
bonus: 3
"#;
        assert!(serde_saphyr::from_str::<QuizConfig>(yaml).is_err());
    }
}
