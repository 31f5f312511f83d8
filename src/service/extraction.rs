//! Claim extraction: sentence segmentation, keyword prefilter, and
//! location entity resolution.
//!
//! A cheap keyword prefilter bounds the number of entity-recognition
//! calls; only matching sentences are re-analyzed for locations.

use std::sync::Arc;

use crate::model::config::ExtractionConfig;
use crate::model::Claim;
use crate::service::recognizer::{EntityRecognizer, NerError};

/// Extracts location-bearing claims from raw report text.
pub struct ClaimExtractor {
    recognizer: Arc<dyn EntityRecognizer>,
    config: ExtractionConfig,
}

impl ClaimExtractor {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>, config: ExtractionConfig) -> Self {
        Self { recognizer, config }
    }

    /// Extract claims from report text.
    ///
    /// Empty input yields an empty list, not an error. A recognition
    /// failure on the full document is terminal; a failure on a single
    /// sentence only drops that sentence.
    pub async fn extract(&self, text: &str) -> Result<Vec<Claim>, NerError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let sentences = self.recognizer.analyze(text).await?;

        let mut claims = Vec::new();
        let mut matched = 0;

        for sentence in sentences {
            let clean = normalize_sentence(&sentence.text);
            if !self.matches_keywords(&clean) {
                continue;
            }
            matched += 1;

            match self.resolve_location(&clean).await {
                Ok(Some(location)) => {
                    claims.push(Claim {
                        text: clean,
                        location,
                    });
                }
                Ok(None) => {
                    tracing::debug!(
                        sentence = %clean.chars().take(80).collect::<String>(),
                        "No accepted entity in sentence, dropping"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        sentence = %clean.chars().take(80).collect::<String>(),
                        "Entity recognition failed for sentence, dropping"
                    );
                }
            }
        }

        tracing::info!(
            sentences_matched = matched,
            claims = claims.len(),
            "Claim extraction complete"
        );

        Ok(claims)
    }

    fn matches_keywords(&self, sentence: &str) -> bool {
        let lower = sentence.to_lowercase();
        self.config.keywords.iter().any(|k| lower.contains(k))
    }

    /// Pick the location for one claim sentence.
    ///
    /// Recognition is re-run on the isolated sentence string so entities
    /// from other sentences can never leak into this claim. A sentence
    /// naming several places still yields a single claim: the first
    /// accepted entity in sentence order wins.
    async fn resolve_location(&self, sentence: &str) -> Result<Option<String>, NerError> {
        let analyzed = self.recognizer.analyze(sentence).await?;

        Ok(analyzed
            .into_iter()
            .flat_map(|s| s.entities)
            .find(|e| self.config.accepted_labels.iter().any(|l| l == &e.label))
            .map(|e| e.text))
    }
}

/// Trim and collapse newlines so sentence text is single-line.
fn normalize_sentence(text: &str) -> String {
    text.trim().replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::recognizer::{AnalyzedSentence, Entity};
    use async_trait::async_trait;

    /// Splits on '.' and reports entities from a fixed vocabulary, only
    /// for words actually present in the analyzed text.
    struct FakeRecognizer {
        vocabulary: Vec<(&'static str, &'static str)>,
    }

    impl FakeRecognizer {
        fn with_places() -> Self {
            Self {
                vocabulary: vec![
                    ("Bangalore", "PERSON"),
                    ("Sumatra", "NORP"),
                    ("Nairobi", "GPE"),
                    ("Acme Corp", "ORG"),
                ],
            }
        }
    }

    #[async_trait]
    impl EntityRecognizer for FakeRecognizer {
        async fn analyze(&self, text: &str) -> Result<Vec<AnalyzedSentence>, NerError> {
            Ok(text
                .split('.')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    // Entities come back in sentence order, as a real
                    // model would report them.
                    let mut found: Vec<(usize, Entity)> = self
                        .vocabulary
                        .iter()
                        .filter_map(|(word, label)| {
                            s.find(word).map(|pos| {
                                (
                                    pos,
                                    Entity {
                                        text: word.to_string(),
                                        label: label.to_string(),
                                    },
                                )
                            })
                        })
                        .collect();
                    found.sort_by_key(|(pos, _)| *pos);

                    AnalyzedSentence {
                        text: s.to_string(),
                        entities: found.into_iter().map(|(_, e)| e).collect(),
                    }
                })
                .collect())
        }
    }

    fn extractor() -> ClaimExtractor {
        ClaimExtractor::new(
            Arc::new(FakeRecognizer::with_places()),
            ExtractionConfig::default(),
        )
    }

    #[tokio::test]
    async fn empty_text_yields_no_claims() {
        let claims = extractor().extract("   ").await.unwrap();
        assert!(claims.is_empty());
    }

    #[tokio::test]
    async fn sentences_without_keywords_produce_no_claims() {
        let claims = extractor()
            .extract("We visited Bangalore last year. Nairobi was lovely.")
            .await
            .unwrap();
        assert!(claims.is_empty());
    }

    #[tokio::test]
    async fn keyword_sentence_without_entity_is_dropped() {
        let claims = extractor()
            .extract("We reduced plastic waste in all our offices globally, a big project.")
            .await
            .unwrap();
        assert!(claims.is_empty());
    }

    #[tokio::test]
    async fn person_label_is_accepted_as_location() {
        // The small-model workaround: Bangalore tagged PERSON still counts.
        let claims = extractor()
            .extract("We initiated a reforestation project in Bangalore to improve air quality.")
            .await
            .unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].location, "Bangalore");
    }

    #[tokio::test]
    async fn first_accepted_entity_wins() {
        let claims = extractor()
            .extract("Trees were planted across Nairobi and Sumatra.")
            .await
            .unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].location, "Nairobi");
    }

    #[tokio::test]
    async fn locations_never_leak_across_sentences() {
        // First sentence names a place but no keyword; second has a keyword
        // but no entity. Isolation means neither yields a claim.
        let claims = extractor()
            .extract("Our HQ is in Nairobi. We replanted several hectares nearby.")
            .await
            .unwrap();
        assert!(claims.is_empty());
    }

    #[tokio::test]
    async fn resolved_location_appears_in_own_sentence() {
        let claims = extractor()
            .extract("Water access improved in Sumatra. A conservation push in Nairobi followed.")
            .await
            .unwrap();
        assert_eq!(claims.len(), 2);
        for claim in claims {
            assert!(claim.text.contains(&claim.location));
        }
    }

    #[tokio::test]
    async fn label_set_is_configuration() {
        let config = ExtractionConfig {
            accepted_labels: vec!["GPE".to_string()],
            ..ExtractionConfig::default()
        };
        let extractor =
            ClaimExtractor::new(Arc::new(FakeRecognizer::with_places()), config);

        // Bangalore is tagged PERSON by the fake model; a strict label set
        // must reject it.
        let claims = extractor
            .extract("We initiated a reforestation project in Bangalore.")
            .await
            .unwrap();
        assert!(claims.is_empty());
    }

    #[test]
    fn normalize_collapses_newlines() {
        assert_eq!(
            normalize_sentence("  We planted\ntrees\r\nhere  "),
            "We planted trees  here"
        );
    }
}
