use crate::http::HttpClient;

/// Scores review text into a polarity in [-1.0, 1.0]
///
/// The score is computed once when a review is submitted and stored with it;
/// nothing reads it back through the scorer.
#[derive(Clone)]
pub enum SentimentScorer {
    /// Built-in word lexicon, always available
    Lexicon,
    /// External text-analysis service reached over HTTP
    Remote { client: HttpClient, url: String },
}

impl SentimentScorer {
    /// Remote scorer when a service URL is configured, lexicon otherwise
    pub fn new(client: HttpClient, url: Option<String>) -> Self {
        match url {
            Some(url) if !url.trim().is_empty() => SentimentScorer::Remote { client, url },
            _ => SentimentScorer::Lexicon,
        }
    }

    /// Polarity of `text`, or `None` if the remote service could not answer
    ///
    /// A missing score is stored as NULL; the review itself is still accepted.
    pub async fn score(&self, text: &str) -> Option<f64> {
        match self {
            SentimentScorer::Lexicon => Some(lexicon_polarity(text)),
            SentimentScorer::Remote { client, url } => match client.get_sentiment(url, text).await {
                Ok(polarity) => Some(polarity.clamp(-1.0, 1.0)),
                Err(e) => {
                    tracing::warn!("Sentiment service unavailable, storing review without score: {}", e);
                    None
                }
            },
        }
    }
}

const NEGATION_FACTOR: f64 = -0.5;

const LEXICON: &[(&str, f64)] = &[
    ("amazing", 0.6),
    ("aromatic", 0.4),
    ("awesome", 1.0),
    ("best", 1.0),
    ("cheap", 0.4),
    ("classic", 0.17),
    ("clean", 0.37),
    ("creamy", 0.3),
    ("crispy", 0.3),
    ("decent", 0.17),
    ("delicious", 1.0),
    ("enjoyed", 0.5),
    ("excellent", 1.0),
    ("fantastic", 0.4),
    ("favorite", 0.5),
    ("favourite", 0.5),
    ("fine", 0.42),
    ("flavorful", 0.6),
    ("flavourful", 0.6),
    ("fresh", 0.3),
    ("friendly", 0.38),
    ("good", 0.7),
    ("great", 0.8),
    ("happy", 0.8),
    ("love", 0.5),
    ("loved", 0.7),
    ("nice", 0.6),
    ("ok", 0.5),
    ("okay", 0.5),
    ("perfect", 1.0),
    ("refreshing", 0.6),
    ("rich", 0.37),
    ("satisfying", 0.5),
    ("strong", 0.43),
    ("tasty", 0.6),
    ("tender", 0.3),
    ("wonderful", 1.0),
    ("yummy", 0.8),
    ("average", -0.15),
    ("awful", -1.0),
    ("bad", -0.7),
    ("bland", -0.5),
    ("boring", -1.0),
    ("burnt", -0.6),
    ("dirty", -0.6),
    ("disappointed", -0.75),
    ("disappointing", -0.6),
    ("disgusting", -1.0),
    ("dry", -0.3),
    ("expensive", -0.5),
    ("greasy", -0.4),
    ("hate", -0.8),
    ("horrible", -1.0),
    ("meh", -0.3),
    ("oily", -0.3),
    ("overpriced", -0.5),
    ("poor", -0.4),
    ("rude", -0.3),
    ("salty", -0.3),
    ("slow", -0.3),
    ("soggy", -0.5),
    ("stale", -0.5),
    ("terrible", -1.0),
    ("undercooked", -0.5),
    ("watery", -0.4),
    ("worst", -1.0),
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("absolutely", 1.5),
    ("bit", 0.7),
    ("extremely", 1.5),
    ("incredibly", 1.5),
    ("quite", 1.1),
    ("really", 1.3),
    ("slightly", 0.7),
    ("so", 1.2),
    ("super", 1.3),
    ("too", 1.2),
    ("very", 1.3),
];

const NEGATIONS: &[&str] = &["never", "no", "not", "nothing"];

/// Words that may sit between a modifier and the word it modifies
const FILLERS: &[&str] = &["a", "an", "the", "at", "all"];

fn lookup(table: &[(&str, f64)], word: &str) -> Option<f64> {
    table
        .iter()
        .find(|(entry, _)| *entry == word)
        .map(|(_, value)| *value)
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.ends_with("n't")
}

/// Lexicon-based polarity
///
/// Each lexicon word contributes its polarity, scaled by any intensifiers right
/// before it and flipped (times -0.5) by a preceding negation. The result is the
/// mean of the contributions clamped to [-1, 1]; text without lexicon words
/// scores 0.
pub fn lexicon_polarity(text: &str) -> f64 {
    // Typographic apostrophes (wasn’t) count as plain ones so contractions stay
    // one token; quotes around a word ('good') are stripped before lookup.
    let lowered = text.to_lowercase().replace('\u{2019}', "'");
    let words = lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|word| word.trim_matches('\''))
        .filter(|word| !word.is_empty());

    let mut scores: Vec<f64> = Vec::new();
    let mut multiplier = 1.0;
    let mut negated = false;

    for word in words {
        if let Some(polarity) = lookup(LEXICON, word) {
            let mut score = polarity * multiplier;
            if negated {
                score *= NEGATION_FACTOR;
            }
            scores.push(score.clamp(-1.0, 1.0));
            multiplier = 1.0;
            negated = false;
        } else if let Some(intensity) = lookup(INTENSIFIERS, word) {
            multiplier *= intensity;
        } else if is_negation(word) {
            negated = true;
        } else if !FILLERS.contains(&word) {
            multiplier = 1.0;
            negated = false;
        }
    }

    if scores.is_empty() {
        return 0.0;
    }

    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    mean.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn empty_and_neutral_text_score_zero() {
        assert_eq!(lexicon_polarity(""), 0.0);
        assert_eq!(lexicon_polarity("I had the samosa at noon."), 0.0);
    }

    #[test]
    fn positive_and_negative_reviews() {
        assert!(lexicon_polarity("Absolutely the best samosa on campus!") > 0.9);
        assert!(lexicon_polarity("The cold coffee was terrible and watery.") < -0.5);
        assert!(lexicon_polarity("The Paneer Butter Masala is creamy and delicious.") > 0.5);
    }

    #[test]
    fn mixed_review_stays_mildly_positive() {
        let score = lexicon_polarity("Really good, but a bit too oily sometimes.");
        assert!(score > 0.0 && score < 0.7, "score was {score}");
    }

    #[test]
    fn negation_flips_polarity() {
        assert!(lexicon_polarity("not good") < 0.0);
        assert!(lexicon_polarity("It wasn't bad at all") > 0.0);
    }

    #[test]
    fn curly_apostrophe_keeps_negation() {
        assert!(lexicon_polarity("It wasn\u{2019}t good") < 0.0);
        assert_eq!(
            lexicon_polarity("It wasn\u{2019}t good"),
            lexicon_polarity("It wasn't good")
        );
    }

    #[test]
    fn quoted_words_still_match() {
        assert_eq!(lexicon_polarity("The samosa was 'good'"), 0.7);
        assert_eq!(lexicon_polarity("'not' 'good'"), lexicon_polarity("not good"));
    }

    #[test]
    fn score_is_clamped() {
        let score = lexicon_polarity("absolutely extremely incredibly delicious");
        assert_eq!(score, 1.0);
        let score = lexicon_polarity("extremely extremely terrible");
        assert_eq!(score, -1.0);
    }

    #[tokio::test]
    async fn lexicon_scorer_always_scores() {
        let scorer = SentimentScorer::new(HttpClient::new(reqwest::Client::new()), None);
        assert!(matches!(scorer, SentimentScorer::Lexicon));
        assert_eq!(scorer.score("").await, Some(0.0));
    }

    #[tokio::test]
    async fn remote_scorer_reads_polarity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sentiment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "polarity": 1.7
            })))
            .mount(&server)
            .await;

        let scorer = SentimentScorer::new(
            HttpClient::new(reqwest::Client::new()),
            Some(format!("{}/sentiment", server.uri())),
        );
        assert_eq!(scorer.score("great").await, Some(1.0));
    }

    #[tokio::test]
    async fn remote_failure_yields_no_score() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let scorer = SentimentScorer::new(
            HttpClient::new(reqwest::Client::new()),
            Some(server.uri()),
        );
        assert_eq!(scorer.score("great").await, None);
    }

    #[tokio::test]
    async fn stalled_service_times_out_without_score() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "polarity": 0.5 }))
                    .set_delay(std::time::Duration::from_secs(60)),
            )
            .mount(&server)
            .await;

        let scorer = SentimentScorer::new(HttpClient::with_timeout(1), Some(server.uri()));
        let outcome =
            tokio::time::timeout(std::time::Duration::from_secs(10), scorer.score("great food"))
                .await;
        assert!(matches!(outcome, Ok(None)), "outcome was {outcome:?}");
    }
}
