//! Local pointer samples.

/// One pointer-movement sample taken from the host page.
///
/// `page_*` coordinates are relative to the whole document and are what gets
/// shared; `client_*` coordinates are relative to the viewport and only drive
/// the local cursor overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub page_x: f64,
    pub page_y: f64,
    pub client_x: f64,
    pub client_y: f64,
    /// Full scrollable width of the document
    pub document_width: f64,
    /// Full scrollable height of the document
    pub document_height: f64,
}

impl PointerSample {
    /// Creates a sample where page and client coordinates coincide (no scroll)
    pub fn new(x: f64, y: f64, document_width: f64, document_height: f64) -> Self {
        PointerSample {
            page_x: x,
            page_y: y,
            client_x: x,
            client_y: y,
            document_width,
            document_height,
        }
    }

    /// Sets the viewport-relative coordinates
    pub fn with_client(mut self, client_x: f64, client_y: f64) -> Self {
        self.client_x = client_x;
        self.client_y = client_y;
        self
    }

    /// Converts the page position into fractions of the document size.
    ///
    /// Returns `None` when the document has no area or the result is not
    /// finite, so such samples are never put on the wire.
    pub fn normalized(&self) -> Option<(f64, f64)> {
        if !(self.document_width > 0.0 && self.document_height > 0.0) {
            return None;
        }

        let x = self.page_x / self.document_width;
        let y = self.page_y / self.document_height;
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }
}

/// The local pointer as drawn by the show-my-cursor overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalCursor {
    /// Viewport x in pixels
    pub x: f64,
    /// Viewport y in pixels
    pub y: f64,
    pub name: String,
}
