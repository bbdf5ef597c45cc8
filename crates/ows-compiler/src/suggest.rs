use strsim::normalized_damerau_levenshtein;

const SIMILARITY_THRESHOLD: f64 = 0.4;

/// Closest known name to `unknown`, if any is close enough to be a likely typo.
pub(crate) fn closest_name<'a>(unknown: &str, names: &[&'a str]) -> Option<&'a str> {
    let mut best: Option<(&'a str, f64)> = None;
    for name in names.iter().copied() {
        let similarity = normalized_damerau_levenshtein(name, unknown);
        if best.map_or(true, |(_, highest)| similarity > highest) {
            best = Some((name, similarity));
        }
    }
    best.filter(|(_, similarity)| *similarity > SIMILARITY_THRESHOLD)
        .map(|(name, _)| name)
}
