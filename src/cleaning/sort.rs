use num_complex::Complex64;

/// Stable permutation that sorts `channels` ascending
///
/// `channels[perm[i]]` is non-decreasing and steps on the same channel keep
/// their acquisition order.
pub fn sort_permutation(channels: &[u8]) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..channels.len()).collect();
    perm.sort_by_key(|&i| channels[i]);
    perm
}

/// Drop steps that repeat the previous channel
///
/// `channels` must already be sorted. The first occurrence of every channel
/// is kept, both in the channel list and in every path of `pcts`.
pub fn dedup_sorted(
    channels: Vec<u8>,
    pcts: Vec<Vec<Complex64>>,
) -> (Vec<u8>, Vec<Vec<Complex64>>) {
    let keep: Vec<bool> = channels
        .iter()
        .enumerate()
        .map(|(i, &ch)| i == 0 || channels[i - 1] != ch)
        .collect();

    let removed = keep.iter().filter(|&&k| !k).count();
    if removed > 0 {
        log::trace!("Removing {} revisited channel steps", removed);
    }

    let channels = channels
        .into_iter()
        .zip(keep.iter())
        .filter_map(|(ch, &k)| k.then_some(ch))
        .collect();
    let pcts = pcts
        .into_iter()
        .map(|pct| {
            pct.into_iter()
                .zip(keep.iter())
                .filter_map(|(s, &k)| k.then_some(s))
                .collect()
        })
        .collect();
    (channels, pcts)
}
