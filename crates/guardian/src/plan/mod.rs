//! Escape plan document and editor.
//!
//! A plan is a background floor-plan image, a list of point markers placed in
//! percentage coordinates, and a freehand ink [`Overlay`]. [`PlanDocument`] is
//! the serialized shape; [`PlanEditor`] owns one document together with the
//! active tool and persists every mutation through a
//! [`DocumentStore`](crate::storage::DocumentStore).

pub mod background;
pub mod overlay;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use background::{BackgroundImage, DownscaleLimits};
pub use overlay::Overlay;

use crate::config::PlanConfig;
use crate::error::{Error, Result};
use crate::storage::{documents, DocumentKey, DocumentStore};

/// Kind of safety feature a marker denotes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Emergency exit.
    Exit,
    /// Fire extinguisher.
    Extinguisher,
    /// Emergency kit.
    Kit,
    /// Hazard area.
    Danger,
    /// Assembly point.
    Assembly,
    /// Gas or water shut-off valve.
    Valve,
}

impl MarkerKind {
    /// Every kind, in toolbar order.
    pub const ALL: [Self; 6] = [
        Self::Exit,
        Self::Extinguisher,
        Self::Kit,
        Self::Danger,
        Self::Assembly,
        Self::Valve,
    ];

    /// Identifier used in stored documents and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exit => "exit",
            Self::Extinguisher => "extinguisher",
            Self::Kit => "kit",
            Self::Danger => "danger",
            Self::Assembly => "assembly",
            Self::Valve => "valve",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Exit => "Exit",
            Self::Extinguisher => "Fire extinguisher",
            Self::Kit => "Emergency kit",
            Self::Danger => "Danger",
            Self::Assembly => "Assembly point",
            Self::Valve => "Shut-off valve",
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::invalid_input(format!("unknown marker kind: {s}")))
    }
}

/// A position on the plan, in percent of the plan width and height.
///
/// Both coordinates are always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanPoint {
    x: f64,
    y: f64,
}

impl PlanPoint {
    /// Create a point, clamping each coordinate into `0..=100`.
    ///
    /// NaN is treated as 0.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_percent(x),
            y: clamp_percent(y),
        }
    }

    /// Horizontal position in percent.
    #[must_use]
    pub fn x(self) -> f64 {
        self.x
    }

    /// Vertical position in percent.
    #[must_use]
    pub fn y(self) -> f64 {
        self.y
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// A point annotation on the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MarkerRecord")]
pub struct Marker {
    id: String,
    x: f64,
    y: f64,
    #[serde(rename = "type")]
    kind: MarkerKind,
}

impl Marker {
    fn new(kind: MarkerKind, at: PlanPoint) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            x: at.x(),
            y: at.y(),
            kind,
        }
    }

    /// Unique marker id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Position on the plan.
    #[must_use]
    pub fn position(&self) -> PlanPoint {
        PlanPoint::new(self.x, self.y)
    }

    /// What the marker denotes.
    #[must_use]
    pub fn kind(&self) -> MarkerKind {
        self.kind
    }
}

/// Stored marker shape. Coordinates are clamped on the way in.
#[derive(Deserialize)]
struct MarkerRecord {
    id: String,
    x: f64,
    y: f64,
    #[serde(rename = "type")]
    kind: MarkerKind,
}

impl From<MarkerRecord> for Marker {
    fn from(record: MarkerRecord) -> Self {
        let at = PlanPoint::new(record.x, record.y);
        Self {
            id: record.id,
            x: at.x(),
            y: at.y(),
            kind: record.kind,
        }
    }
}

/// The persisted escape plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "or_discard"
    )]
    background_image: Option<BackgroundImage>,
    #[serde(default)]
    markers: Vec<Marker>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "or_discard"
    )]
    overlay: Option<Overlay>,
}

/// Deserialize an optional image field, dropping it if it is unreadable so
/// the rest of the plan survives.
fn or_discard<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(value) = Option::<serde_json::Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            warn!("Discarding unreadable plan image: {e}");
            Ok(None)
        }
    }
}

impl PlanDocument {
    /// An empty plan: no background, no markers, no ink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The background image, if one is set.
    #[must_use]
    pub fn background(&self) -> Option<&BackgroundImage> {
        self.background_image.as_ref()
    }

    /// Markers in placement order.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Look up a marker by id.
    #[must_use]
    pub fn marker(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// The freehand overlay, if anything has been drawn since the last clear.
    #[must_use]
    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    /// Replace the background. Markers and overlay are untouched.
    pub fn set_background(&mut self, image: BackgroundImage) {
        self.background_image = Some(image);
    }

    /// Append a marker and return its id.
    pub fn place_marker(&mut self, kind: MarkerKind, at: PlanPoint) -> &Marker {
        self.markers.push(Marker::new(kind, at));
        &self.markers[self.markers.len() - 1]
    }

    /// Remove the marker with `id`. Returns `false` if there was none.
    pub fn remove_marker(&mut self, id: &str) -> bool {
        let before = self.markers.len();
        self.markers.retain(|m| m.id != id);
        self.markers.len() != before
    }

    /// Remove every marker.
    pub fn clear_markers(&mut self) {
        self.markers.clear();
    }

    /// Erase the freehand overlay.
    pub fn clear_overlay(&mut self) {
        self.overlay = None;
    }

    fn overlay_mut(&mut self, width: u32, height: u32) -> &mut Overlay {
        self.overlay.get_or_insert_with(|| Overlay::new(width, height))
    }
}

/// A placement or drawing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Freehand pen.
    Pen,
    /// Places markers of one kind.
    Marker(MarkerKind),
}

#[derive(Debug, Clone, Copy)]
struct Stroke {
    last: PlanPoint,
    segments: usize,
}

/// Counts for a plan at a glance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    /// Total number of markers.
    pub markers: usize,
    /// Marker counts per kind; kinds with no markers are omitted.
    pub by_kind: BTreeMap<MarkerKind, usize>,
    /// Whether a background image is set.
    pub has_background: bool,
    /// Whether the overlay carries any ink.
    pub has_ink: bool,
}

/// Interactive editor over the stored plan.
///
/// The editor is the single writer of the `plan_data` slot. Every mutation
/// writes the whole document back; a stroke is written once, when it ends.
/// Dropping the editor mid-stroke discards the unfinished stroke, while
/// [`PlanEditor::into_store`] finishes and saves it first.
#[derive(Debug)]
pub struct PlanEditor<S: DocumentStore> {
    store: S,
    document: PlanDocument,
    tool: Option<Tool>,
    stroke: Option<Stroke>,
    config: PlanConfig,
}

impl<S: DocumentStore> PlanEditor<S> {
    /// Load the plan from `store`, falling back to an empty plan.
    pub fn open(store: S, config: PlanConfig) -> Self {
        let document = documents::load_or(&store, DocumentKey::PlanData, PlanDocument::new);
        debug!(
            markers = document.markers.len(),
            background = document.background_image.is_some(),
            "Plan loaded"
        );
        Self {
            store,
            document,
            tool: None,
            stroke: None,
            config,
        }
    }

    /// The current document.
    #[must_use]
    pub fn document(&self) -> &PlanDocument {
        &self.document
    }

    /// The active tool, if any.
    #[must_use]
    pub fn tool(&self) -> Option<Tool> {
        self.tool
    }

    /// Select `tool`, or deactivate it if it is already active.
    ///
    /// Any stroke in progress ends first.
    pub fn select_tool(&mut self, tool: Tool) -> Option<Tool> {
        self.end_stroke();
        self.tool = if self.tool == Some(tool) {
            None
        } else {
            Some(tool)
        };
        self.tool
    }

    /// Handle a tap on an empty part of the plan.
    ///
    /// Places a marker when a marker tool is active and returns its id.
    pub fn tap(&mut self, at: PlanPoint) -> Option<String> {
        match self.tool {
            Some(Tool::Marker(kind)) => Some(self.place_marker(kind, at)),
            Some(Tool::Pen) | None => None,
        }
    }

    /// Handle a tap directly on a marker: it is removed.
    pub fn tap_marker(&mut self, id: &str) -> bool {
        self.remove_marker(id)
    }

    /// Place a marker and return its id.
    pub fn place_marker(&mut self, kind: MarkerKind, at: PlanPoint) -> String {
        let id = self.document.place_marker(kind, at).id().to_string();
        debug!(%kind, x = at.x(), y = at.y(), "Placed marker");
        self.persist();
        id
    }

    /// Remove a marker. Removing an unknown id changes nothing.
    pub fn remove_marker(&mut self, id: &str) -> bool {
        if !self.document.remove_marker(id) {
            return false;
        }
        self.persist();
        true
    }

    /// Remove every marker.
    pub fn clear_markers(&mut self) {
        self.document.clear_markers();
        self.persist();
    }

    /// Erase all freehand ink.
    pub fn clear_overlay(&mut self) {
        self.stroke = None;
        self.document.clear_overlay();
        self.persist();
    }

    /// Replace the background with an already prepared image.
    pub fn set_background(&mut self, image: BackgroundImage) {
        self.document.set_background(image);
        self.persist();
    }

    /// Downscale and store an uploaded image as the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a decodable image. The document
    /// is left unchanged in that case.
    pub fn set_background_image(&mut self, bytes: &[u8]) -> Result<()> {
        let image = background::downscale(bytes, DownscaleLimits::from(&self.config))?;
        self.set_background(image);
        Ok(())
    }

    /// Like [`PlanEditor::set_background_image`], decoding on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a decodable image.
    pub async fn set_background_image_async(&mut self, bytes: Vec<u8>) -> Result<()> {
        let image =
            background::downscale_async(bytes, DownscaleLimits::from(&self.config)).await?;
        self.set_background(image);
        Ok(())
    }

    /// Replace the background with the generated example floor plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the example cannot be encoded.
    pub fn load_example(&mut self) -> Result<()> {
        let image = background::example_floor_plan(self.config.example_quality)?;
        info!("Loaded example floor plan");
        self.set_background(image);
        Ok(())
    }

    /// Pointer pressed on the surface. Starts a stroke if the pen is active.
    pub fn pointer_down(&mut self, at: PlanPoint) -> bool {
        if self.tool != Some(Tool::Pen) {
            return false;
        }
        self.stroke = Some(Stroke {
            last: at,
            segments: 0,
        });
        true
    }

    /// Pointer moved. Extends the current stroke with a straight segment.
    pub fn pointer_move(&mut self, to: PlanPoint) -> bool {
        let Some(stroke) = self.stroke.as_mut() else {
            return false;
        };
        let from = stroke.last;
        stroke.last = to;
        stroke.segments += 1;

        let (width, height) = (self.config.overlay_width, self.config.overlay_height);
        self.document
            .overlay_mut(width, height)
            .draw_segment(from, to);
        true
    }

    /// Pointer released. Ends the stroke.
    pub fn pointer_up(&mut self) {
        self.end_stroke();
    }

    /// Pointer left the surface. Ends the stroke.
    pub fn pointer_leave(&mut self) {
        self.end_stroke();
    }

    /// Draw a connected polyline in one stroke.
    ///
    /// Returns `false` without drawing when the pen is not active.
    pub fn draw_polyline(&mut self, points: &[PlanPoint]) -> bool {
        let Some((first, rest)) = points.split_first() else {
            return false;
        };
        if !self.pointer_down(*first) {
            return false;
        }
        for point in rest {
            self.pointer_move(*point);
        }
        self.pointer_up();
        true
    }

    /// Whether a stroke is in progress.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.stroke.is_some()
    }

    /// Counts for the current document.
    #[must_use]
    pub fn summary(&self) -> PlanSummary {
        let mut by_kind = BTreeMap::new();
        for marker in &self.document.markers {
            *by_kind.entry(marker.kind).or_insert(0) += 1;
        }
        PlanSummary {
            markers: self.document.markers.len(),
            by_kind,
            has_background: self.document.background_image.is_some(),
            has_ink: self
                .document
                .overlay
                .as_ref()
                .is_some_and(|o| !o.is_blank()),
        }
    }

    /// Finish any open stroke and give back the store.
    pub fn into_store(mut self) -> S {
        self.end_stroke();
        self.store
    }

    fn end_stroke(&mut self) {
        if let Some(stroke) = self.stroke.take() {
            if stroke.segments > 0 {
                debug!(segments = stroke.segments, "Stroke finished");
                self.persist();
            }
        }
    }

    fn persist(&self) {
        documents::save(&self.store, DocumentKey::PlanData, &self.document);
    }
}
