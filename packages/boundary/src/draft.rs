#![allow(clippy::module_name_repetitions)]
//! In-progress boundary drafting.
//!
//! One draft is active per editing session at most. The state machine is
//! `Idle -> Drawing -> (finalize | cancel) -> Idle`; calling [`BoundaryDraft::begin`]
//! while already drawing discards the previous draft and says so in the
//! returned outcome, so callers can notify the user instead of losing
//! points silently.

use farm_map_farm_models::{Coordinate, Polygon};
use farm_map_geometry::ring_is_valid;
use thiserror::Error;

/// Errors from draft operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    /// The operation requires an active draft.
    #[error("no draft in progress")]
    NotDrawing,

    /// Finalize requires at least 3 points.
    #[error("draft has {count} points, need at least 3 to finalize")]
    TooFewPoints {
        /// Points currently in the draft.
        count: usize,
    },

    /// The point is outside the valid WGS84 coordinate range.
    #[error("point ({latitude}, {longitude}) is out of range")]
    PointOutOfRange {
        /// Rejected latitude.
        latitude: f64,
        /// Rejected longitude.
        longitude: f64,
    },

    /// The completed ring failed validation; the draft stays active so the
    /// user can adjust and retry.
    #[error(transparent)]
    InvalidGeometry(#[from] farm_map_geometry::GeometryError),
}

/// Result of [`BoundaryDraft::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginOutcome {
    /// A fresh draft was started from `Idle`.
    Started,
    /// A draft was already active; its points were discarded.
    RestartedDiscarding {
        /// Number of points thrown away from the superseded draft.
        discarded_points: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DraftState {
    Idle,
    Drawing,
}

/// Holds the polygon being actively drawn, before it is committed.
///
/// The draft is transient: it is never persisted, and is discarded on
/// cancel or converted into a committed [`Polygon`] on finalize.
#[derive(Debug)]
pub struct BoundaryDraft {
    state: DraftState,
    points: Vec<Coordinate>,
}

impl Default for BoundaryDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundaryDraft {
    /// Creates an idle draft manager.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: DraftState::Idle,
            points: Vec::new(),
        }
    }

    /// Starts drawing. If a draft was already active its points are
    /// discarded and the outcome reports how many, so the caller can
    /// surface the restart to the user.
    pub fn begin(&mut self) -> BeginOutcome {
        let outcome = if self.state == DraftState::Drawing {
            let discarded = self.points.len();
            log::debug!("restarting draft, discarding {discarded} points");
            BeginOutcome::RestartedDiscarding {
                discarded_points: discarded,
            }
        } else {
            BeginOutcome::Started
        };
        self.points.clear();
        self.state = DraftState::Drawing;
        outcome
    }

    /// Appends a vertex to the active draft.
    ///
    /// Re-placing the same point twice in a row is a no-op rather than an
    /// error — touch input produces duplicate taps routinely.
    ///
    /// # Errors
    ///
    /// [`DraftError::NotDrawing`] outside an active draft;
    /// [`DraftError::PointOutOfRange`] for coordinates outside WGS84
    /// bounds.
    pub fn add_point(&mut self, point: Coordinate) -> Result<(), DraftError> {
        if self.state != DraftState::Drawing {
            return Err(DraftError::NotDrawing);
        }
        if !point.is_in_range() {
            return Err(DraftError::PointOutOfRange {
                latitude: point.latitude,
                longitude: point.longitude,
            });
        }
        if self.points.last() == Some(&point) {
            return Ok(());
        }
        self.points.push(point);
        Ok(())
    }

    /// Validates and commits the draft, returning the completed polygon
    /// and returning the manager to `Idle`.
    ///
    /// # Errors
    ///
    /// [`DraftError::NotDrawing`] outside an active draft;
    /// [`DraftError::TooFewPoints`] below 3 points;
    /// [`DraftError::InvalidGeometry`] if the ring fails validation — the
    /// draft then REMAINS active with its points intact so the user can
    /// fix the shape instead of starting over.
    pub fn finalize(&mut self) -> Result<Polygon, DraftError> {
        if self.state != DraftState::Drawing {
            return Err(DraftError::NotDrawing);
        }
        if self.points.len() < 3 {
            return Err(DraftError::TooFewPoints {
                count: self.points.len(),
            });
        }

        ring_is_valid(&self.points)?;

        self.state = DraftState::Idle;
        let vertices = std::mem::take(&mut self.points);
        Ok(Polygon::new(vertices))
    }

    /// Discards the draft from any state and returns how many points were
    /// thrown away.
    pub fn cancel(&mut self) -> usize {
        let discarded = self.points.len();
        self.points.clear();
        self.state = DraftState::Idle;
        discarded
    }

    /// Points placed so far, in placement order.
    #[must_use]
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// `true` while a draft is active.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.state == DraftState::Drawing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farm_map_geometry::GeometryError;

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng)
    }

    #[test]
    fn add_point_requires_begin() {
        let mut draft = BoundaryDraft::new();
        assert_eq!(draft.add_point(c(40.0, -90.0)), Err(DraftError::NotDrawing));
    }

    #[test]
    fn finalize_round_trips_points_in_order() {
        let mut draft = BoundaryDraft::new();
        assert_eq!(draft.begin(), BeginOutcome::Started);
        let points = [c(40.0, -90.0), c(40.001, -90.0), c(40.001, -89.999)];
        for p in points {
            draft.add_point(p).unwrap();
        }
        let polygon = draft.finalize().unwrap();
        assert_eq!(polygon.vertices, points);
        assert!(!draft.is_drawing());
        assert!(draft.points().is_empty());
    }

    #[test]
    fn duplicate_consecutive_point_is_a_no_op() {
        let mut draft = BoundaryDraft::new();
        draft.begin();
        draft.add_point(c(40.0, -90.0)).unwrap();
        draft.add_point(c(40.0, -90.0)).unwrap();
        assert_eq!(draft.points().len(), 1);
    }

    #[test]
    fn rejects_out_of_range_point() {
        let mut draft = BoundaryDraft::new();
        draft.begin();
        assert!(matches!(
            draft.add_point(c(95.0, -90.0)),
            Err(DraftError::PointOutOfRange { .. })
        ));
    }

    #[test]
    fn finalize_needs_three_points() {
        let mut draft = BoundaryDraft::new();
        draft.begin();
        draft.add_point(c(40.0, -90.0)).unwrap();
        draft.add_point(c(40.001, -90.0)).unwrap();
        assert_eq!(
            draft.finalize(),
            Err(DraftError::TooFewPoints { count: 2 })
        );
        // Still drawing; the user can keep adding points.
        assert!(draft.is_drawing());
    }

    #[test]
    fn invalid_ring_keeps_draft_active() {
        let mut draft = BoundaryDraft::new();
        draft.begin();
        // Bowtie: crosses itself.
        for p in [
            c(40.000, -90.000),
            c(40.001, -89.999),
            c(40.001, -90.000),
            c(40.000, -89.999),
        ] {
            draft.add_point(p).unwrap();
        }
        assert!(matches!(
            draft.finalize(),
            Err(DraftError::InvalidGeometry(
                GeometryError::SelfIntersection { .. }
            ))
        ));
        assert!(draft.is_drawing());
        assert_eq!(draft.points().len(), 4);
    }

    #[test]
    fn begin_while_drawing_reports_discarded_points() {
        let mut draft = BoundaryDraft::new();
        draft.begin();
        draft.add_point(c(40.0, -90.0)).unwrap();
        draft.add_point(c(40.001, -90.0)).unwrap();
        assert_eq!(
            draft.begin(),
            BeginOutcome::RestartedDiscarding {
                discarded_points: 2
            }
        );
        assert!(draft.points().is_empty());
        assert!(draft.is_drawing());
    }

    #[test]
    fn cancel_discards_and_idles() {
        let mut draft = BoundaryDraft::new();
        draft.begin();
        draft.add_point(c(40.0, -90.0)).unwrap();
        assert_eq!(draft.cancel(), 1);
        assert!(!draft.is_drawing());
        assert_eq!(draft.cancel(), 0);
    }
}
