use crate::utils::bbox::BoundingBox;
use log::trace;

/// Trait to implement association engines.
///
/// Association engine decides which candidate detection (if any) continues
/// every existing track.
///
pub trait Voting {
    /// Method that selects winning candidates
    ///
    /// # Arguments
    /// * `tracks` - boxes of the existing tracks in tracker order
    /// * `candidates` - boxes detected in the current frame
    ///
    /// Returns one element per track: the index of the claimed candidate or `None`.
    /// A candidate is claimed by at most one track.
    ///
    fn winners(&self, tracks: &[BoundingBox], candidates: &[BoundingBox]) -> Vec<Option<usize>>;
}

/// Greedy IoU association.
///
/// Tracks are visited in order; every track claims the unclaimed candidate with
/// the highest IoU strictly above the threshold. Earlier tracks win contested
/// candidates regardless of the scores later tracks would have. Among equal
/// scores the candidate with the lowest index wins.
///
#[derive(Debug, Clone, Copy)]
pub struct GreedyIoUVoting {
    threshold: f32,
}

impl GreedyIoUVoting {
    /// Constructs new engine
    ///
    /// # Arguments
    /// * `threshold` - IoU that a candidate must exceed to be claimed
    ///
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl Voting for GreedyIoUVoting {
    fn winners(&self, tracks: &[BoundingBox], candidates: &[BoundingBox]) -> Vec<Option<usize>> {
        let mut claimed = vec![false; candidates.len()];

        tracks
            .iter()
            .map(|track_box| {
                let mut best: Option<(usize, f32)> = None;
                for (index, candidate) in candidates.iter().enumerate() {
                    if claimed[index] {
                        continue;
                    }
                    let score = BoundingBox::iou(track_box, candidate);
                    let floor = best.map(|(_, s)| s).unwrap_or(self.threshold);
                    if score > floor {
                        best = Some((index, score));
                    }
                }
                trace!("Track box {:?} votes for {:?}", track_box, best);
                best.map(|(index, _)| {
                    claimed[index] = true;
                    index
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::trackers::voting::{GreedyIoUVoting, Voting};
    use crate::utils::bbox::BoundingBox;

    #[test]
    fn best_candidate_wins() {
        let voting = GreedyIoUVoting::new(0.3);
        let tracks = [BoundingBox::new(0, 0, 10, 10)];
        let candidates = [
            BoundingBox::new(3, 0, 13, 10),
            BoundingBox::new(1, 0, 11, 10),
            BoundingBox::new(50, 50, 60, 60),
        ];
        assert_eq!(voting.winners(&tracks, &candidates), vec![Some(1)]);
    }

    #[test]
    fn threshold_is_strict() {
        let voting = GreedyIoUVoting::new(0.5);
        let tracks = [BoundingBox::new(0, 0, 10, 10)];
        // 100 / (100 + 200 - 100)
        let candidates = [BoundingBox::new(0, 0, 20, 10)];
        assert_eq!(
            BoundingBox::iou(&tracks[0], &candidates[0]),
            0.5,
            "fixture must sit exactly on the threshold"
        );
        assert_eq!(voting.winners(&tracks, &candidates), vec![None]);
    }

    #[test]
    fn first_track_takes_contested_candidate() {
        let voting = GreedyIoUVoting::new(0.3);
        // the second track overlaps the candidate better, yet the first one is served first
        let tracks = [BoundingBox::new(0, 0, 10, 10), BoundingBox::new(2, 0, 12, 10)];
        let candidates = [BoundingBox::new(2, 0, 12, 10)];
        assert_eq!(voting.winners(&tracks, &candidates), vec![Some(0), None]);
    }

    #[test]
    fn candidates_are_not_shared() {
        let voting = GreedyIoUVoting::new(0.3);
        let tracks = [BoundingBox::new(0, 0, 10, 10), BoundingBox::new(100, 0, 110, 10)];
        let candidates = [BoundingBox::new(101, 0, 111, 10), BoundingBox::new(1, 0, 11, 10)];
        assert_eq!(voting.winners(&tracks, &candidates), vec![Some(1), Some(0)]);
    }

    #[test]
    fn empty_inputs() {
        let voting = GreedyIoUVoting::new(0.3);
        assert!(voting.winners(&[], &[BoundingBox::new(0, 0, 1, 1)]).is_empty());
        assert_eq!(
            voting.winners(&[BoundingBox::new(0, 0, 1, 1)], &[]),
            vec![None]
        );
    }
}
