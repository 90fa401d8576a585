/// Status text shown while no slot is visible.
pub const NO_MARKERS: &str = "No markers found";

/// Status entry for one visible marker.
pub fn status_line(marker_id: i32, distance: f64) -> String {
    format!("Marker ID: {marker_id}\nDistance: {distance:.4}\n\n")
}

/// Accumulates one entry per visible slot, in slot order.
#[derive(Clone, Debug, Default)]
pub struct StatusSummary {
    text: String,
    entries: usize,
}

impl StatusSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, marker_id: i32, distance: f64) {
        self.text.push_str(&status_line(marker_id, distance));
        self.entries += 1;
    }

    #[inline]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Final text; the placeholder when nothing was pushed.
    pub fn finish(self) -> String {
        if self.entries == 0 {
            NO_MARKERS.to_owned()
        } else {
            self.text
        }
    }
}
