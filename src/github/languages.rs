use indexmap::IndexMap;

use crate::models::{LanguageCount, LanguageShare, LanguageStatistics};

const TOP_LANGUAGES: usize = 5;

/// Counts primary languages, skipping repositories without one.
pub fn count_languages<'a>(
    languages: impl IntoIterator<Item = Option<&'a str>>,
) -> IndexMap<String, usize> {
    languages
        .into_iter()
        .flatten()
        .fold(IndexMap::new(), |mut counts, language| {
            *counts.entry(language.to_string()).or_insert(0) += 1;
            counts
        })
}

/// Highest counts first; equal counts keep first-appearance order.
fn rank(counts: &IndexMap<String, usize>, limit: usize) -> Vec<(&str, usize)> {
    let mut ranked: Vec<(&str, usize)> = counts
        .iter()
        .map(|(name, &count)| (name.as_str(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    ranked
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percentage(count: usize, total: usize) -> u32 {
    ((count as f64 / total as f64) * 100.0).round() as u32
}

pub fn language_statistics<'a>(
    languages: impl IntoIterator<Item = Option<&'a str>>,
) -> LanguageStatistics {
    let counts = count_languages(languages);
    let total_repos = counts.values().sum();

    let top_languages = rank(&counts, TOP_LANGUAGES)
        .into_iter()
        .map(|(name, count)| LanguageShare {
            name: name.to_string(),
            count,
            percentage: percentage(count, total_repos),
        })
        .collect();

    LanguageStatistics {
        languages: counts,
        total_repos,
        top_languages,
    }
}

pub fn top_language_counts<'a>(
    languages: impl IntoIterator<Item = Option<&'a str>>,
) -> Vec<LanguageCount> {
    let counts = count_languages(languages);
    rank(&counts, TOP_LANGUAGES)
        .into_iter()
        .map(|(name, count)| LanguageCount {
            name: name.to_string(),
            count,
        })
        .collect()
}
