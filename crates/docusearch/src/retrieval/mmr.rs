//! Vector similarity and maximal-marginal-relevance selection

/// Cosine similarity between two vectors; 0.0 for empty or zero-norm input
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dim = a.len().min(b.len());
    if dim == 0 {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for i in 0..dim {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    dot / denom
}

/// Scale a vector to unit length in place; zero vectors are left unchanged
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Greedy maximal-marginal-relevance selection
///
/// Returns up to `k` indices into `candidates` in selection order. The first
/// pick is the candidate most similar to the query; each later pick maximizes
/// `lambda * sim(query, c) - (1 - lambda) * max(sim(c, selected))`.
/// `lambda = 1.0` reduces to plain similarity ranking.
pub fn maximal_marginal_relevance(
    query: &[f32],
    candidates: &[Vec<f32>],
    k: usize,
    lambda: f32,
) -> Vec<usize> {
    let k = k.min(candidates.len());
    if k == 0 {
        return Vec::new();
    }

    let query_sims: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(query, c))
        .collect();

    let mut selected: Vec<usize> = Vec::with_capacity(k);
    // Highest similarity to any selected candidate, per candidate
    let mut redundancy = vec![f32::NEG_INFINITY; candidates.len()];

    while selected.len() < k {
        let mut best: Option<(usize, f32)> = None;

        for (i, &relevance) in query_sims.iter().enumerate() {
            if selected.contains(&i) {
                continue;
            }
            let score = if selected.is_empty() {
                relevance
            } else {
                lambda * relevance - (1.0 - lambda) * redundancy[i]
            };
            // Strict comparison keeps the earliest candidate on ties
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((i, score));
            }
        }

        let Some((pick, _)) = best else { break };
        selected.push(pick);

        for (i, candidate) in candidates.iter().enumerate() {
            let sim = cosine_similarity(&candidates[pick], candidate);
            if sim > redundancy[i] {
                redundancy[i] = sim;
            }
        }
    }

    selected
}
