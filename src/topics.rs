//! Word frequency over free-text journal and log content.

use std::collections::HashMap;

/// How many topics the word cloud shows
pub const TOPIC_LIMIT: usize = 30;

/// Tokens this short never count as topics
pub const MIN_TOKEN_LEN: usize = 4;

/// Common English words that carry no topic
pub const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "also", "because", "been", "before", "being",
    "below", "between", "both", "could", "does", "doing", "down", "during", "each", "even",
    "every", "from", "further", "have", "having", "here", "into", "itself", "just",
    "like", "made", "make", "many", "more", "most", "much", "myself", "need", "only", "other",
    "ourselves", "over", "really", "same", "should", "some", "such", "than", "that", "their",
    "theirs", "them", "themselves", "then", "there", "these", "they", "thing", "things", "this",
    "those", "through", "today", "under", "until", "very", "want", "were", "what", "when",
    "where", "which", "while", "will", "with", "would", "your", "yours", "yourself",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub word: String,
    pub count: usize,
}

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Lowercase, keep only `[a-z0-9_]` and whitespace, split on whitespace.
/// Letters outside ASCII are dropped, so "café" becomes "caf".
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().filter_map(|raw| {
        let token: String = raw
            .chars()
            .flat_map(char::to_lowercase)
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
            .collect();
        if token.is_empty() { None } else { Some(token) }
    })
}

/// Count topic words across `texts` and return the `limit` most frequent,
/// by descending count and then alphabetically
pub fn top_topics<'a, I>(texts: I, limit: usize) -> Vec<Topic>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for token in tokenize(text) {
            if token.len() < MIN_TOKEN_LEN || is_stop_word(&token) {
                continue;
            }
            *counts.entry(token).or_insert(0) += 1;
        }
    }

    let mut topics: Vec<Topic> = counts
        .into_iter()
        .map(|(word, count)| Topic { word, count })
        .collect();
    topics.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    topics.truncate(limit);
    topics
}

/// Visual weight of a topic, linear between `floor` and `ceiling` in
/// `count / max_count`. A zero `max_count` is treated as 1.
pub fn topic_weight(count: usize, max_count: usize, floor: f64, ceiling: f64) -> f64 {
    let max_count = max_count.max(1);
    let ratio = (count.min(max_count) as f64) / (max_count as f64);
    floor + (ceiling - floor) * ratio
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_orders_topics() {
        let texts = [
            "Recorded the fractions video, fractions are hard",
            "Edited fractions footage; recorded voiceover",
            "Planning the geometry lesson",
        ];
        let topics = top_topics(texts, TOPIC_LIMIT);
        assert_eq!(topics[0], Topic { word: "fractions".into(), count: 3 });
        assert_eq!(topics[1], Topic { word: "recorded".into(), count: 2 });
        for pair in topics.windows(2) {
            assert!(pair[0].count >= pair[1].count);
            if pair[0].count == pair[1].count {
                assert!(pair[0].word < pair[1].word);
            }
        }
    }

    #[test]
    fn drops_short_tokens_and_stop_words() {
        let topics = top_topics(["the cat sat with them about this lesson"], TOPIC_LIMIT);
        assert_eq!(topics, vec![Topic { word: "lesson".into(), count: 1 }]);
    }

    #[test]
    fn strips_punctuation_and_non_ascii_letters() {
        let topics = top_topics(["Café! script_v2 (draft)"], TOPIC_LIMIT);
        let words: Vec<&str> = topics.iter().map(|t| t.word.as_str()).collect();
        assert_eq!(words, vec!["draft", "script_v2"]);
    }

    #[test]
    fn output_is_deterministic_and_limited() {
        let text: String = (0..50).map(|i| format!("word{:02} ", i)).collect();
        let first = top_topics([text.as_str()], TOPIC_LIMIT);
        let second = top_topics([text.as_str()], TOPIC_LIMIT);
        assert_eq!(first.len(), TOPIC_LIMIT);
        assert_eq!(first, second);
        assert_eq!(first[0].word, "word00");
    }

    #[test]
    fn weight_is_bounded_and_monotonic() {
        assert_eq!(topic_weight(0, 0, 0.75, 2.5), 0.75);
        assert_eq!(topic_weight(4, 4, 0.75, 2.5), 2.5);
        let mut last = f64::MIN;
        for count in 0..=10 {
            let weight = topic_weight(count, 10, 0.75, 2.5);
            assert!(weight >= last);
            last = weight;
        }
    }
}
