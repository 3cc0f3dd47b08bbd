use crate::domain::event::{NOT_PLAYED, RoundDetail, format_net_score};

use super::row::RawHole;

/// Build the hole-by-hole breakdown of one round.
///
/// Holes are ordered by hole number; a hole without one takes its 1-based position in the
/// scorecard. A hole without a positive stroke count is shown as `-`
/// and does not count as played; a round without a single played hole yields `None`. A par
/// of zero means the provider did not publish it, so the hole's net is `-` as well.
pub(super) fn round_detail(holes: Vec<RawHole>) -> Option<RoundDetail> {
    let mut numbered: Vec<(i64, RawHole)> = holes
        .into_iter()
        .zip(1i64..)
        .map(|(hole, position)| {
            let number = hole
                .hole
                .as_ref()
                .and_then(|cell| cell.int())
                .unwrap_or(position);
            (number, hole)
        })
        .collect();
    numbered.sort_by_key(|(number, _)| *number);

    let mut detail = RoundDetail::default();
    let mut played = 0usize;
    for (_, hole) in numbered {
        let par = hole
            .par
            .as_ref()
            .and_then(|cell| cell.int())
            .and_then(|par| u32::try_from(par).ok())
            .unwrap_or(0);
        let strokes = hole
            .score
            .as_ref()
            .and_then(|cell| cell.int())
            .filter(|strokes| *strokes > 0);

        match strokes {
            Some(strokes) => {
                played += 1;
                detail.round_values.push(strokes.to_string());
                detail.net_values.push(if par == 0 {
                    NOT_PLAYED.to_string()
                } else {
                    format_net_score(strokes - i64::from(par))
                });
            }
            None => {
                detail.round_values.push(NOT_PLAYED.to_string());
                detail.net_values.push(NOT_PLAYED.to_string());
            }
        }
        detail.par_values.push(par);
    }

    (played > 0).then_some(detail)
}
