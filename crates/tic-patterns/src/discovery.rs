//! Pattern discovery: finds new text/URL signatures shared by a cluster
//! of confirmed-threat samples the seeded and learned tables didn't catch.
//! A candidate is promoted when enough samples share it and those samples
//! are similar enough to each other (character-trigram cosine similarity)
//! that the shared substring is plausibly the reason they're all threats,
//! rather than a coincidence.

use std::collections::{HashMap, HashSet};
use tic_common::TicConfig;

#[derive(Debug, Clone)]
pub struct DiscoverySample {
    pub content_hash: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct DiscoveredPattern {
    pub signature: String,
    pub threat_type: String,
    pub confidence: f32,
    pub occurrences: u32,
}

/// Extract word bigrams/trigrams (and, for URL-shaped samples, host-suffix
/// tokens) as candidate signatures, count how many samples share each one,
/// and promote those that clear both the occurrence floor and the
/// average-pairwise-cosine-similarity floor.
pub fn discover_patterns(samples: &[DiscoverySample], cfg: &TicConfig) -> Vec<DiscoveredPattern> {
    let mut candidate_support: HashMap<String, Vec<usize>> = HashMap::new();

    for (idx, sample) in samples.iter().enumerate() {
        for candidate in candidates_for(&sample.text) {
            candidate_support.entry(candidate).or_default().push(idx);
        }
    }

    let mut out = Vec::new();
    for (signature, supporting) in candidate_support {
        let mut unique_supporting: Vec<usize> = supporting;
        unique_supporting.dedup();
        if unique_supporting.len() < cfg.discovery_min_occurrences as usize {
            continue;
        }

        let supporting_texts: Vec<&str> = unique_supporting
            .iter()
            .map(|&i| samples[i].text.as_str())
            .collect();
        let similarity = average_pairwise_cosine(&supporting_texts);
        if similarity < cfg.discovery_min_cosine {
            continue;
        }

        out.push(DiscoveredPattern {
            signature,
            threat_type: "learned".to_string(),
            confidence: similarity,
            occurrences: unique_supporting.len() as u32,
        });
    }

    out.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());
    out
}

/// Word trigrams (and bigrams for short texts), plus the registrable-host
/// suffix when the sample looks like a URL.
fn candidates_for(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    let mut out = HashSet::new();

    for window in words.windows(3) {
        out.insert(window.join(" "));
    }
    if words.len() < 3 {
        for window in words.windows(2) {
            out.insert(window.join(" "));
        }
    }

    if let Some(start) = lower.find("://") {
        let rest = &lower[start + 3..];
        let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
        if let Some(dot) = host.rfind('.') {
            if let Some(prev_dot) = host[..dot].rfind('.') {
                out.insert(host[prev_dot + 1..].to_string());
            } else {
                out.insert(host.to_string());
            }
        }
    }

    out
}

/// Character-trigram cosine similarity, averaged over every pair in
/// `texts`. Returns 1.0 for a single sample (trivially similar to itself).
fn average_pairwise_cosine(texts: &[&str]) -> f32 {
    if texts.len() <= 1 {
        return 1.0;
    }
    let vectors: Vec<HashMap<String, u32>> = texts.iter().map(|t| char_trigrams(t)).collect();

    let mut total = 0.0f32;
    let mut pairs = 0u32;
    for i in 0..vectors.len() {
        for j in (i + 1)..vectors.len() {
            total += cosine(&vectors[i], &vectors[j]);
            pairs += 1;
        }
    }
    if pairs == 0 {
        1.0
    } else {
        total / pairs as f32
    }
}

fn char_trigrams(text: &str) -> HashMap<String, u32> {
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    let mut out = HashMap::new();
    if chars.len() < 3 {
        *out.entry(chars.iter().collect()).or_insert(0) += 1;
        return out;
    }
    for window in chars.windows(3) {
        let gram: String = window.iter().collect();
        *out.entry(gram).or_insert(0) += 1;
    }
    out
}

fn cosine(a: &HashMap<String, u32>, b: &HashMap<String, u32>) -> f32 {
    let mut dot = 0.0f32;
    for (k, v) in a {
        if let Some(v2) = b.get(k) {
            dot += *v as f32 * *v2 as f32;
        }
    }
    let norm_a: f32 = a.values().map(|v| (*v as f32).powi(2)).sum::<f32>().sqrt();
    let norm_b: f32 = b.values().map(|v| (*v as f32).powi(2)).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(texts: &[&str]) -> Vec<DiscoverySample> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| DiscoverySample {
                content_hash: format!("h{i}"),
                text: t.to_string(),
            })
            .collect()
    }

    #[test]
    fn promotes_a_shared_phrase_across_enough_similar_samples() {
        let texts = [
            "your delivery is on hold pay a fee now",
            "your delivery is on hold pay a fee today",
            "your delivery is on hold pay a fee immediately",
            "your delivery is on hold pay a fee please",
            "your delivery is on hold pay a fee asap",
        ];
        let cfg = TicConfig {
            discovery_min_occurrences: 5,
            discovery_min_cosine: 0.5,
            ..TicConfig::default()
        };
        let found = discover_patterns(&samples(&texts), &cfg);
        assert!(!found.is_empty());
        assert!(found.iter().any(|p| p.signature.contains("delivery")));
    }

    #[test]
    fn below_occurrence_floor_is_not_promoted() {
        let texts = ["unique message one", "totally different message two"];
        let cfg = TicConfig::default();
        let found = discover_patterns(&samples(&texts), &cfg);
        assert!(found.is_empty());
    }

    #[test]
    fn extracts_host_suffix_from_url_shaped_sample() {
        let candidates = candidates_for("visit https://sub.evil-example.com/login now");
        assert!(candidates.iter().any(|c| c.contains("evil-example.com")));
    }
}
