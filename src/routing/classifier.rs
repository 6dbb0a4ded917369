//! On-topic gate
//!
//! Keyword policy is plain data. Matching is case-folded substring
//! containment, so `law` also matches `lawn` and `ai` matches `mail`.

use tracing::debug;

/// Topics the coach refuses. Checked first; any hit rejects the prompt.
#[rustfmt::skip]
pub const NON_TECHNICAL_KEYWORDS: &[&str] = &[
    "cook", "recipe", "food", "meal", "kitchen", "bake", "ingredient",
    "dating", "relationship", "love", "romance", "marriage",
    "medical", "health", "doctor", "medicine", "symptom", "disease",
    "legal", "lawyer", "law", "court", "lawsuit",
    "investment", "stock", "crypto", "bitcoin", "trading",
    "weather", "sports", "game", "movie", "music", "entertainment",
    "travel", "vacation", "hotel", "flight",
    "shopping", "fashion", "clothes", "style",
];

/// Topics the coach accepts explicitly
#[rustfmt::skip]
pub const TECHNICAL_KEYWORDS: &[&str] = &[
    "programming", "code", "software", "development", "developer",
    "python", "java", "javascript", "react", "node", "aws", "cloud",
    "ai", "artificial intelligence", "machine learning", "ml", "data science",
    "algorithm", "database", "sql", "api", "framework", "library",
    "career", "job", "interview", "resume", "certification", "course",
    "skill", "learn", "study", "education", "training", "bootcamp",
    "technology", "tech", "computer", "engineering", "devops",
    "cybersecurity", "security", "network", "system", "architecture",
    "agile", "scrum", "project management", "leadership", "management",
];

/// Ordered label table for the redirect message. Independent of
/// [`NON_TECHNICAL_KEYWORDS`]: a prompt rejected for `music` gets the default label.
pub const OFF_TOPIC_LABELS: &[(&[&str], &str)] = &[
    (&["cook", "recipe", "food"], "cooking"),
    (&["dating", "relationship"], "relationships"),
    (&["health", "medical"], "health advice"),
    (&["legal", "law"], "legal advice"),
    (&["investment", "stock"], "investment advice"),
    (&["weather"], "weather"),
    (&["sports", "game"], "sports or games"),
];

pub const DEFAULT_OFF_TOPIC_LABEL: &str = "that topic";

/// Outcome of the topic gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicVerdict {
    /// Matched a non-technical keyword
    OffTopic { keyword: String },
    /// Matched a technical keyword
    Technical { keyword: String },
    /// No keyword matched; accepted by default
    Unclassified,
}

impl TopicVerdict {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::OffTopic { .. })
    }
}

/// Keyword classifier over two ordered tables
#[derive(Debug, Clone)]
pub struct TopicClassifier {
    non_technical: Vec<String>,
    technical: Vec<String>,
}

impl Default for TopicClassifier {
    fn default() -> Self {
        Self::new(NON_TECHNICAL_KEYWORDS, TECHNICAL_KEYWORDS)
    }
}

impl TopicClassifier {
    /// Build a classifier from custom tables. Keywords are lower-cased.
    pub fn new(non_technical: &[&str], technical: &[&str]) -> Self {
        let lower = |words: &[&str]| words.iter().map(|w| w.to_lowercase()).collect();
        Self {
            non_technical: lower(non_technical),
            technical: lower(technical),
        }
    }

    pub fn classify(&self, prompt: &str) -> TopicVerdict {
        let prompt_lower = prompt.to_lowercase();

        if let Some(keyword) = first_match(&self.non_technical, &prompt_lower) {
            debug!("Prompt matched non-technical keyword '{}'", keyword);
            return TopicVerdict::OffTopic {
                keyword: keyword.to_string(),
            };
        }

        match first_match(&self.technical, &prompt_lower) {
            Some(keyword) => TopicVerdict::Technical {
                keyword: keyword.to_string(),
            },
            None => TopicVerdict::Unclassified,
        }
    }

    pub fn is_technical(&self, prompt: &str) -> bool {
        self.classify(prompt).is_accepted()
    }
}

fn first_match<'a>(keywords: &'a [String], prompt_lower: &str) -> Option<&'a str> {
    keywords
        .iter()
        .find(|keyword| prompt_lower.contains(keyword.as_str()))
        .map(String::as_str)
}

/// Topic label used in the redirect message
pub fn off_topic_label(prompt: &str) -> &'static str {
    let prompt_lower = prompt.to_lowercase();
    OFF_TOPIC_LABELS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| prompt_lower.contains(k)))
        .map(|(_, label)| *label)
        .unwrap_or(DEFAULT_OFF_TOPIC_LABEL)
}

/// Polite redirect returned for off-topic prompts
pub fn off_topic_response(prompt: &str) -> String {
    let topic = off_topic_label(prompt);
    format!(
        "I'm an AI Upskill Coach focused on technical career development. I can't help with {topic}, but I'd be happy to assist you with:

🚀 **AI & Machine Learning Careers**
• Career paths in AI/ML, data science, and analytics
• Required skills and certifications
• Industry trends and opportunities

💻 **Programming & Development**
• Programming languages (Python, JavaScript, Java, etc.)
• Frameworks and tools
• Best practices and coding skills

📚 **Learning & Certifications**
• Technical courses and bootcamps
• AWS, Google Cloud, Microsoft certifications
• Online learning platforms and resources

📝 **Professional Development**
• Resume optimization for tech roles
• Technical interview preparation
• Career progression strategies

What technical topic would you like to explore today?"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_technical_wins_over_technical() {
        let classifier = TopicClassifier::default();
        let verdict = classifier.classify("Best python recipe for pasta?");

        assert_eq!(
            verdict,
            TopicVerdict::OffTopic {
                keyword: "recipe".to_string()
            }
        );
    }

    #[test]
    fn test_first_non_technical_keyword_reported() {
        // "food" precedes "travel" in the table regardless of prompt order
        let verdict = TopicClassifier::default().classify("travel food");
        assert_eq!(
            verdict,
            TopicVerdict::OffTopic {
                keyword: "food".to_string()
            }
        );
    }

    #[test]
    fn test_technical_prompt_accepted() {
        let verdict = TopicClassifier::default().classify("How do I prepare for a DevOps INTERVIEW?");
        assert!(matches!(verdict, TopicVerdict::Technical { .. }));
    }

    #[test]
    fn test_keyword_free_prompt_accepted_by_default() {
        let verdict = TopicClassifier::default().classify("hello there");
        assert_eq!(verdict, TopicVerdict::Unclassified);
        assert!(verdict.is_accepted());
    }

    #[test]
    fn test_substring_matching_is_not_word_bounded() {
        // "lawn" contains "law"
        assert!(!TopicClassifier::default().is_technical("mowing the lawn with kubernetes"));
    }

    #[test]
    fn test_off_topic_labels() {
        assert_eq!(off_topic_label("any good recipe?"), "cooking");
        assert_eq!(off_topic_label("Dating tips"), "relationships");
        assert_eq!(off_topic_label("medical question"), "health advice");
        assert_eq!(off_topic_label("hire a lawyer"), "legal advice");
        assert_eq!(off_topic_label("stock picks"), "investment advice");
        assert_eq!(off_topic_label("weather tomorrow"), "weather");
        assert_eq!(off_topic_label("video game"), "sports or games");
        assert_eq!(off_topic_label("favourite music"), "that topic");
    }

    #[test]
    fn test_off_topic_response_names_topic() {
        let response = off_topic_response("what's the weather like");
        assert!(response.contains("I can't help with weather"));
        assert!(response.ends_with("What technical topic would you like to explore today?"));
    }

    #[test]
    fn test_custom_tables_are_case_folded() {
        let classifier = TopicClassifier::new(&["Poetry"], &["Rust"]);
        assert!(!classifier.is_technical("write me POETRY"));
        assert!(matches!(
            classifier.classify("learning rust"),
            TopicVerdict::Technical { .. }
        ));
    }
}
