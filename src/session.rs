//! Section and waypoint manager.
//!
//! Every external event (operator action, position watch, timer sample,
//! speech transcript) is a [`Command`] applied through [`Session::dispatch`].
//! The direct methods are the same transitions without the envelope.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, iso_timestamp};
use crate::draft::{self, DraftStore};
use crate::error::{RallyError, Result};
use crate::export::{self, ExportFile, ExportMeta};
use crate::geodesy::{cumulative_distance_km, distance_between, round2};
use crate::geolocation::{GeoErrorCode, GpsState};
use crate::icons;
use crate::options::{PositionOptions, SessionOptions};
use crate::route_types::*;

/// The section currently being recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSection {
    pub name: String,
    pub start: Coordinate,
    /// Tags tracking samples so late ones from a closed section are dropped.
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SectionState {
    #[default]
    Idle,
    Active(ActiveSection),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    Fix {
        lat: f64,
        lon: f64,
        #[serde(default)]
        accuracy: Option<f64>,
    },
    PositionError {
        code: u16,
    },
    StartSection,
    AddWaypoint,
    #[serde(rename_all = "camelCase")]
    TagLastWaypoint {
        name: String,
        icon_src: String,
    },
    SelectIcon {
        name: String,
    },
    Transcript {
        text: String,
    },
    EditWaypoint {
        index: usize,
        name: String,
        poi: String,
    },
    EditWaypointId {
        id: WaypointId,
        name: String,
        poi: String,
    },
    DeleteWaypoints {
        indices: BTreeSet<usize>,
    },
    DeleteWaypointIds {
        ids: Vec<WaypointId>,
    },
    UndoLastWaypoint,
    TrackingSample {
        generation: u64,
        lat: f64,
        lon: f64,
    },
    #[serde(rename_all = "camelCase")]
    EndSection {
        #[serde(default)]
        route_name: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionStarted {
    pub name: String,
    pub generation: u64,
    pub interval_ms: u32,
    pub sample_options: PositionOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionExport {
    pub summary: SectionSummary,
    pub files: Vec<ExportFile>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Outcome {
    GpsUpdated,
    GpsError { message: &'static str },
    SectionStarted(SectionStarted),
    WaypointAdded { waypoint: Waypoint },
    Updated,
    /// The command had nothing to act on.
    Unchanged,
    Deleted { count: usize },
    TrackingRecorded,
    SampleDropped,
    SectionEnded(SectionExport),
}

pub struct Session {
    options: SessionOptions,
    clock: Box<dyn Clock>,
    draft: Box<dyn DraftStore>,
    gps: GpsState,
    state: SectionState,
    waypoints: Vec<Waypoint>,
    tracking: Vec<TrackingPoint>,
    total_distance: f64,
    section_counter: u32,
    generation: u64,
    next_id: u64,
    summaries: Vec<SectionSummary>,
}

impl Session {
    /// Create a session, recovering any waypoints left in the draft store.
    pub fn new(options: SessionOptions, clock: Box<dyn Clock>, draft: Box<dyn DraftStore>) -> Self {
        let mut session = Self {
            options,
            clock,
            draft,
            gps: GpsState::default(),
            state: SectionState::Idle,
            waypoints: Vec::new(),
            tracking: Vec::new(),
            total_distance: 0.0,
            section_counter: 0,
            generation: 0,
            next_id: 1,
            summaries: Vec::new(),
        };
        session.recover_draft();
        session
    }

    fn recover_draft(&mut self) {
        let stored = match self.draft.load(&self.options.draft_key) {
            Ok(Some(json)) => json,
            Ok(None) => return,
            Err(e) => {
                log::warn!("draft load failed: {e}");
                return;
            }
        };

        match draft::decode(&stored) {
            Ok(mut waypoints) => {
                for wp in &mut waypoints {
                    wp.set_id(self.allocate_id());
                }
                log::info!("recovered {} waypoints from draft", waypoints.len());
                self.waypoints = waypoints;
            }
            Err(e) => log::warn!("ignoring unreadable draft: {e}"),
        }
    }

    pub fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::Fix { lat, lon, accuracy } => {
                self.update_position(Fix::new(lat, lon, accuracy));
                Ok(Outcome::GpsUpdated)
            }
            Command::PositionError { code } => Ok(Outcome::GpsError {
                message: self.position_error(GeoErrorCode::from_code(code)),
            }),
            Command::StartSection => self.start_section().map(Outcome::SectionStarted),
            Command::AddWaypoint => self
                .add_waypoint()
                .map(|waypoint| Outcome::WaypointAdded { waypoint }),
            Command::TagLastWaypoint { name, icon_src } => {
                Ok(changed(self.tag_last_waypoint(&name, &icon_src)))
            }
            Command::SelectIcon { name } => Ok(changed(self.select_icon(&name))),
            Command::Transcript { text } => Ok(changed(self.annotate_last_waypoint(&text))),
            Command::EditWaypoint { index, name, poi } => self
                .edit_waypoint(index, &name, &poi)
                .map(|()| Outcome::Updated),
            Command::EditWaypointId { id, name, poi } => self
                .edit_waypoint_by_id(id, &name, &poi)
                .map(|()| Outcome::Updated),
            Command::DeleteWaypoints { indices } => self
                .delete_waypoints(&indices)
                .map(|count| Outcome::Deleted { count }),
            Command::DeleteWaypointIds { ids } => self
                .delete_waypoints_by_id(&ids)
                .map(|count| Outcome::Deleted { count }),
            Command::UndoLastWaypoint => Ok(changed(self.undo_last_waypoint().is_some())),
            Command::TrackingSample {
                generation,
                lat,
                lon,
            } => {
                if self.record_tracking_point(generation, Fix::new(lat, lon, None)) {
                    Ok(Outcome::TrackingRecorded)
                } else {
                    Ok(Outcome::SampleDropped)
                }
            }
            Command::EndSection { route_name } => {
                self.end_section(&route_name).map(Outcome::SectionEnded)
            }
        }
    }

    pub fn update_position(&mut self, fix: Fix) {
        log::trace!("position {:?} ±{:?}m", fix.coord, fix.accuracy);
        self.gps.on_fix(fix);
    }

    /// Record a provider error and return the message to show the operator.
    pub fn position_error(&mut self, code: GeoErrorCode) -> &'static str {
        log::warn!("geolocation error: {code:?}");
        self.gps.on_error(code);
        code.message()
    }

    pub fn start_section(&mut self) -> Result<SectionStarted> {
        if self.is_active() {
            return Err(RallyError::Precondition {
                operation: "start section",
                reason: "a section is already active",
            });
        }
        let Some(fix) = self.gps.current_fix() else {
            return Err(RallyError::Precondition {
                operation: "start section",
                reason: "no current position",
            });
        };

        self.waypoints.clear();
        self.tracking.clear();
        self.total_distance = 0.0;
        self.section_counter += 1;
        self.generation += 1;

        let name = format!(
            "{}/Section {}",
            self.clock.now().format("%Y-%m-%d"),
            self.section_counter
        );
        self.state = SectionState::Active(ActiveSection {
            name: name.clone(),
            start: fix.coord,
            generation: self.generation,
        });
        self.persist_draft();

        log::info!("section started: {name} at {:?}", fix.coord);

        Ok(SectionStarted {
            name,
            generation: self.generation,
            interval_ms: self.options.tracking_interval_ms,
            sample_options: self.options.sample_options(),
        })
    }

    pub fn add_waypoint(&mut self) -> Result<Waypoint> {
        let fix = self.gps.current_fix().ok_or(RallyError::NoFix)?;
        let distance = cumulative_distance_km(&self.waypoints, fix.coord);
        let id = self.allocate_id();
        let waypoint = Waypoint::new(id, fix.coord, iso_timestamp(self.clock.now()), distance);

        self.waypoints.push(waypoint.clone());
        self.persist_draft();

        log::debug!("waypoint {id} added at {distance} km");
        Ok(waypoint)
    }

    /// Set the name and icon of the most recent waypoint. Returns false when
    /// there is no waypoint.
    pub fn tag_last_waypoint(&mut self, name: &str, icon_src: &str) -> bool {
        let Some(last) = self.waypoints.last_mut() else {
            return false;
        };
        last.name = name.to_string();
        last.icon_src = icon_src.to_string();
        self.persist_draft();
        true
    }

    /// Tag the most recent waypoint with a catalog icon. Unknown names tag
    /// with the raw name and no asset.
    pub fn select_icon(&mut self, icon_name: &str) -> bool {
        match icons::find(icon_name) {
            Some(icon) => self.tag_last_waypoint(icon.name, icon.src),
            None => self.tag_last_waypoint(icon_name, ""),
        }
    }

    /// Replace the note of the most recent waypoint with dictated text.
    pub fn annotate_last_waypoint(&mut self, text: &str) -> bool {
        let Some(last) = self.waypoints.last_mut() else {
            return false;
        };
        last.poi = text.to_string();
        self.persist_draft();
        true
    }

    pub fn edit_waypoint(&mut self, index: usize, name: &str, poi: &str) -> Result<()> {
        let len = self.waypoints.len();
        let wp = self
            .waypoints
            .get_mut(index)
            .ok_or(RallyError::Index { index, len })?;
        apply_edit(wp, name, poi);
        self.persist_draft();
        Ok(())
    }

    pub fn edit_waypoint_by_id(&mut self, id: WaypointId, name: &str, poi: &str) -> Result<()> {
        let wp = self
            .waypoints
            .iter_mut()
            .find(|wp| wp.id() == id)
            .ok_or(RallyError::UnknownWaypoint(id))?;
        apply_edit(wp, name, poi);
        self.persist_draft();
        Ok(())
    }

    /// Remove the waypoints at `indices` (positions in the current list).
    /// Every index is checked before anything is removed.
    pub fn delete_waypoints(&mut self, indices: &BTreeSet<usize>) -> Result<usize> {
        let len = self.waypoints.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(RallyError::Index { index, len });
        }

        for &index in indices.iter().rev() {
            self.waypoints.remove(index);
        }
        if !indices.is_empty() {
            self.persist_draft();
        }
        Ok(indices.len())
    }

    pub fn delete_waypoints_by_id(&mut self, ids: &[WaypointId]) -> Result<usize> {
        if let Some(&missing) = ids
            .iter()
            .find(|id| !self.waypoints.iter().any(|wp| wp.id() == **id))
        {
            return Err(RallyError::UnknownWaypoint(missing));
        }

        let before = self.waypoints.len();
        self.waypoints.retain(|wp| !ids.contains(&wp.id()));
        let removed = before - self.waypoints.len();
        if removed > 0 {
            self.persist_draft();
        }
        Ok(removed)
    }

    pub fn undo_last_waypoint(&mut self) -> Option<Waypoint> {
        let removed = self.waypoints.pop()?;
        self.persist_draft();
        log::debug!("waypoint {} undone", removed.id());
        Some(removed)
    }

    /// Append a tracking sample requested by the sampler of `generation`.
    ///
    /// Samples arriving while idle or for an earlier section are dropped
    /// without touching the GPS state, and return false.
    pub fn record_tracking_point(&mut self, generation: u64, fix: Fix) -> bool {
        match &self.state {
            SectionState::Active(section) if section.generation == generation => {}
            _ => {
                log::debug!("dropping tracking sample from generation {generation}");
                return false;
            }
        }
        self.gps.on_fix(fix);

        if let Some(prev) = self.tracking.last() {
            let leg = distance_between(prev.coord(), fix.coord);
            self.total_distance = round2(self.total_distance + leg);
        }
        self.tracking
            .push(TrackingPoint::new(fix.coord, iso_timestamp(self.clock.now())));
        true
    }

    /// Close the active section: summarize it, build its export files and
    /// clear the in-progress waypoints and draft.
    pub fn end_section(&mut self, route_name: &str) -> Result<SectionExport> {
        let SectionState::Active(section) = &self.state else {
            return Err(RallyError::Precondition {
                operation: "end section",
                reason: "no section is active",
            });
        };

        let route_name = route_name.trim();
        let export_name = if route_name.is_empty() {
            section.name.as_str()
        } else {
            route_name
        };
        let meta = ExportMeta {
            name: export_name,
            creator: &self.options.creator,
            generated_at: self.clock.now(),
        };
        let stem = export::file_stem(route_name, &section.name);
        let files = export::build_files(&self.waypoints, &self.tracking, &meta, &stem)?;

        let summary = summarize(&section.name, &self.waypoints, route_name, &self.options);
        log::info!(
            "section ended: {} ({} waypoints, {} tracking points)",
            summary.name,
            summary.waypoint_count,
            self.tracking.len()
        );

        self.summaries.push(summary.clone());
        self.waypoints.clear();
        if let Err(e) = self.draft.remove(&self.options.draft_key) {
            log::warn!("draft clear failed: {e}");
        }
        self.state = SectionState::Idle;

        Ok(SectionExport { summary, files })
    }

    pub fn route_stats(&self) -> RouteStats {
        let route_distance = self.waypoints.last().map_or(0.0, |wp| wp.distance());
        let elapsed_min = self
            .tracking
            .first()
            .and_then(|pt| chrono::DateTime::parse_from_rfc3339(pt.timestamp()).ok())
            .map(|start| start.with_timezone(&chrono::Utc))
            .map(|start| {
                let elapsed = self.clock.now().signed_duration_since(start);
                elapsed.num_milliseconds() as f64 / 60_000.0
            })
            .unwrap_or(0.0);

        let avg_speed_kmh = if self.is_active() && self.tracking.len() > 1 && elapsed_min > 0.0 {
            round1(route_distance / (elapsed_min / 60.0))
        } else {
            0.0
        };

        RouteStats {
            total_waypoints: self.waypoints.len(),
            route_distance,
            tracked_distance: self.total_distance,
            duration_min: round1(elapsed_min),
            avg_speed_kmh,
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn tracking_points(&self) -> &[TrackingPoint] {
        &self.tracking
    }

    pub fn summaries(&self) -> &[SectionSummary] {
        &self.summaries
    }

    pub fn state(&self) -> &SectionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SectionState::Active(_))
    }

    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    pub fn section_counter(&self) -> u32 {
        self.section_counter
    }

    pub fn gps(&self) -> &GpsState {
        &self.gps
    }

    pub fn current_fix(&self) -> Option<Fix> {
        self.gps.current_fix()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn draft_store(&self) -> &dyn DraftStore {
        self.draft.as_ref()
    }

    fn allocate_id(&mut self) -> WaypointId {
        let id = WaypointId(self.next_id);
        self.next_id += 1;
        id
    }

    fn persist_draft(&mut self) {
        let result = draft::encode(&self.waypoints)
            .and_then(|json| self.draft.save(&self.options.draft_key, &json));
        if let Err(e) = result {
            log::warn!("draft save failed: {e}");
        }
    }
}

fn changed(applied: bool) -> Outcome {
    if applied {
        Outcome::Updated
    } else {
        Outcome::Unchanged
    }
}

fn apply_edit(wp: &mut Waypoint, name: &str, poi: &str) {
    let name = name.trim();
    wp.name = if name.is_empty() {
        UNNAMED.to_string()
    } else {
        name.to_string()
    };
    wp.poi = poi.trim().to_string();
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Build the end-of-section summary. Distances are the stored snapshots.
pub fn summarize(
    section_name: &str,
    waypoints: &[Waypoint],
    route_name: &str,
    options: &SessionOptions,
) -> SectionSummary {
    const NA: &str = "N/A";

    let mut pois: Vec<String> = Vec::new();
    for wp in waypoints {
        if !wp.poi.is_empty() && !pois.contains(&wp.poi) {
            pois.push(wp.poi.clone());
        }
    }

    let coords = |wp: Option<&Waypoint>| {
        wp.map_or_else(
            || NA.to_string(),
            |wp| wp.coord().format_fixed(options.coordinate_precision),
        )
    };
    let time = |wp: Option<&Waypoint>| wp.map_or(NA, |wp| wp.timestamp()).to_string();

    SectionSummary {
        name: section_name.to_string(),
        waypoint_count: waypoints.len(),
        start_time: time(waypoints.first()),
        end_time: time(waypoints.last()),
        total_distance: round2(waypoints.iter().map(|wp| wp.distance()).sum()),
        pois,
        start_coords: coords(waypoints.first()),
        end_coords: coords(waypoints.last()),
        route_name: if route_name.is_empty() {
            options.default_route_name.clone()
        } else {
            route_name.to_string()
        },
    }
}
