//! The annotation editor: tool/color selection, the pointer and text-entry
//! state machine, undo, and the display/export render paths.
//!
//! Everything runs on the caller's thread. Every state change that affects
//! the picture is followed by a full display render before the call returns,
//! so renders never interleave.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use image::RgbaImage;
use log::{debug, error, info};

use crate::annotation::{Annotation, CursorStyle, Tool};
use crate::capture::{CapturedImage, PageInfo};
use crate::color::Color;
use crate::config::EditorConfig;
use crate::dataurl::encode_png_data_url;
use crate::error::{EditorError, Result};
use crate::export::{encode_png, export_filename, ClipboardSink, FileSink};
use crate::geometry::{canvas_size, fit_scale, Point, Viewport};
use crate::handoff::{load_capture, HandoffStore};
use crate::history::History;
use crate::list::AnnotationList;
use crate::render::{self, RenderStyle};
use crate::upload::{UploadProvider, UploadReceipt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Dragging,
    TextEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKey {
    Enter,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

/// Inline text field opened by the text tool.
#[derive(Debug, Clone, PartialEq)]
pub struct TextField {
    anchor: Point,
    screen: Point,
    color: Color,
    value: String,
    commit_due: Option<Instant>,
}

impl TextField {
    /// Clicked point in image space.
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Where the field sits on the editing surface.
    pub fn screen_position(&self) -> Point {
        self.screen
    }

    /// Color the field was opened with.
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn has_focus(&self) -> bool {
        self.commit_due.is_none()
    }
}

#[derive(Debug, Clone)]
enum Interaction {
    Idle,
    Dragging { provisional: Annotation },
    TextEntry(TextField),
}

pub struct Editor {
    config: EditorConfig,
    style: RenderStyle,
    image: RgbaImage,
    page: Option<PageInfo>,
    viewport: Viewport,
    scale: f64,
    annotations: AnnotationList,
    history: History,
    tool: Tool,
    color: Color,
    interaction: Interaction,
    base: RgbaImage,
    frame: RgbaImage,
    frames_rendered: u64,
    notifications: Vec<Notification>,
}

impl Editor {
    /// Loads `image`, fits it to `viewport`, renders, and records the empty
    /// starting state as the first history entry.
    pub fn new(image: RgbaImage, viewport: Viewport, config: EditorConfig) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(EditorError::EmptyImage { width, height });
        }
        let mut history = History::new(config.history_limit);
        history.push(AnnotationList::new());

        let mut editor = Self {
            style: RenderStyle::from(&config),
            tool: config.default_tool,
            color: config.default_color,
            config,
            image,
            page: None,
            viewport,
            scale: 1.0,
            annotations: AnnotationList::new(),
            history,
            interaction: Interaction::Idle,
            base: RgbaImage::new(1, 1),
            frame: RgbaImage::new(1, 1),
            frames_rendered: 0,
            notifications: Vec::new(),
        };
        editor.fit_to_viewport();
        editor.redraw();
        info!(
            "editor loaded {width}x{height} image at scale {:.3}",
            editor.scale
        );
        Ok(editor)
    }

    pub fn from_capture(
        captured: &CapturedImage,
        viewport: Viewport,
        config: EditorConfig,
    ) -> Result<Self> {
        let image = image::load_from_memory(&captured.png)?.to_rgba8();
        let mut editor = Self::new(image, viewport, config)?;
        editor.page = Some(captured.page.clone());
        Ok(editor)
    }

    /// Reads the capture hand-off once and opens an editor on it.
    pub fn from_store(
        store: &dyn HandoffStore,
        viewport: Viewport,
        config: EditorConfig,
    ) -> Result<Self> {
        let captured = load_capture(store)?.ok_or(EditorError::MissingCapture)?;
        Self::from_capture(&captured, viewport, config)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn page(&self) -> Option<&PageInfo> {
        self.page.as_ref()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Editing surface size in display pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    pub fn annotations(&self) -> &AnnotationList {
        &self.annotations
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn active_tool(&self) -> Tool {
        self.tool
    }

    pub fn active_color(&self) -> Color {
        self.color
    }

    pub fn state(&self) -> InteractionState {
        match self.interaction {
            Interaction::Idle => InteractionState::Idle,
            Interaction::Dragging { .. } => InteractionState::Dragging,
            Interaction::TextEntry(_) => InteractionState::TextEntry,
        }
    }

    pub fn provisional(&self) -> Option<&Annotation> {
        match &self.interaction {
            Interaction::Dragging { provisional } => Some(provisional),
            _ => None,
        }
    }

    pub fn text_field(&self) -> Option<&TextField> {
        match &self.interaction {
            Interaction::TextEntry(field) => Some(field),
            _ => None,
        }
    }

    /// Last display render.
    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn cursor(&self) -> CursorStyle {
        CursorStyle {
            cursor: self.tool.cursor(),
            drawing: matches!(self.interaction, Interaction::Dragging { .. }),
        }
    }

    pub fn select_tool(&mut self, tool: Tool) -> Result<()> {
        if !self.config.tools().contains(&tool) {
            return Err(EditorError::ToolUnavailable(tool));
        }
        self.tool = tool;
        debug!("tool -> {tool}");
        Ok(())
    }

    /// Changes the color for annotations created from now on.
    pub fn select_color(&mut self, color: Color) -> Result<()> {
        if !self.config.palette.contains(&color) {
            return Err(EditorError::UnsupportedColor(color));
        }
        self.color = color;
        debug!("color -> {color}");
        Ok(())
    }

    /// Refits the surface to a new viewport and re-renders.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.fit_to_viewport();
        self.redraw();
    }

    pub fn pointer_down(&mut self, screen: Point) {
        let pos = screen.to_image(self.scale);

        if !self.tool.is_shape() {
            if matches!(self.interaction, Interaction::TextEntry(_)) {
                debug!("discarding unsaved text field");
            }
            self.interaction = Interaction::TextEntry(TextField {
                anchor: pos,
                screen: pos.to_display(self.scale),
                color: self.color,
                value: String::new(),
                commit_due: None,
            });
            return;
        }

        // Clicking the surface takes focus from an open field.
        if matches!(self.interaction, Interaction::TextEntry(_)) {
            self.commit_text_field();
        }
        if let Some(provisional) = Annotation::provisional(self.tool, pos, self.color) {
            self.interaction = Interaction::Dragging { provisional };
        }
    }

    pub fn pointer_move(&mut self, screen: Point) {
        let pos = screen.to_image(self.scale);
        if let Interaction::Dragging { provisional } = &mut self.interaction {
            provisional.set_end(pos);
            self.redraw();
        }
    }

    /// Ends a drag, committing the provisional shape when it is big enough.
    pub fn pointer_up(&mut self, screen: Point) {
        let pos = screen.to_image(self.scale);
        let Interaction::Dragging { mut provisional } =
            std::mem::replace(&mut self.interaction, Interaction::Idle)
        else {
            return;
        };
        provisional.set_end(pos);
        let big_enough = provisional
            .drag_bounds()
            .map(|b| b.exceeds(self.config.min_annotation_size))
            .unwrap_or(false);
        if big_enough {
            self.commit(provisional);
        } else {
            debug!("dropping {} below minimum size", provisional.tool());
        }
        self.redraw();
    }

    /// Leaving the surface mid-drag ends the drag.
    pub fn pointer_leave(&mut self, screen: Point) {
        if matches!(self.interaction, Interaction::Dragging { .. }) {
            self.pointer_up(screen);
        }
    }

    /// Replaces the open text field's contents.
    pub fn set_text(&mut self, value: &str) {
        if let Interaction::TextEntry(field) = &mut self.interaction {
            field.value = value.to_string();
        }
    }

    pub fn text_key(&mut self, key: TextKey) {
        if !matches!(self.interaction, Interaction::TextEntry(_)) {
            return;
        }
        match key {
            TextKey::Enter => self.commit_text_field(),
            TextKey::Escape => {
                self.interaction = Interaction::Idle;
                debug!("text entry cancelled");
            }
        }
    }

    /// The field lost focus; it commits after the grace delay unless it
    /// regains focus first.
    pub fn text_blur(&mut self, now: Instant) {
        let grace = Duration::from_millis(self.config.text_commit_grace_ms);
        if let Interaction::TextEntry(field) = &mut self.interaction {
            field.commit_due = Some(now + grace);
        }
    }

    pub fn text_focus(&mut self) {
        if let Interaction::TextEntry(field) = &mut self.interaction {
            field.commit_due = None;
        }
    }

    /// Fires a pending blur commit whose grace delay has elapsed.
    pub fn tick(&mut self, now: Instant) {
        let due = match &self.interaction {
            Interaction::TextEntry(field) => field.commit_due.is_some_and(|at| at <= now),
            _ => false,
        };
        if due {
            self.commit_text_field();
        }
    }

    /// Restores the previous committed state. Returns false when there is
    /// nothing left to undo.
    pub fn undo(&mut self) -> bool {
        let Some(state) = self.history.undo() else {
            return false;
        };
        self.annotations = state;
        debug!(
            "undo -> {} annotations, {} history entries",
            self.annotations.len(),
            self.history.len()
        );
        self.redraw();
        true
    }

    /// Image plus committed annotations at native resolution.
    pub fn render_export(&self) -> RgbaImage {
        render::compose(&self.image, 1.0, self.annotations.iter(), None, &self.style)
    }

    pub fn download(&mut self, sink: &mut dyn FileSink) -> Result<PathBuf> {
        let filename = export_filename(Utc::now());
        let saved = encode_png(&self.render_export()).and_then(|png| sink.save(&filename, &png));
        match saved {
            Ok(path) => {
                info!("saved {}", path.display());
                self.notify(NotificationKind::Success, "Screenshot saved!");
                Ok(path)
            }
            Err(err) => {
                error!("failed to save screenshot: {err}");
                self.notify(NotificationKind::Error, "Failed to save screenshot");
                Err(err)
            }
        }
    }

    pub fn copy_to_clipboard(&mut self, sink: &mut dyn ClipboardSink) -> Result<()> {
        let composite = self.render_export();
        let copied = encode_png(&composite).and_then(|png| sink.write_image(&composite, &png));
        match copied {
            Ok(()) => {
                info!("copied {}x{} image to clipboard", composite.width(), composite.height());
                self.notify(NotificationKind::Success, "Copied to clipboard!");
                Ok(())
            }
            Err(err) => {
                error!("failed to copy: {err}");
                self.notify(NotificationKind::Error, "Failed to copy to clipboard");
                Err(err)
            }
        }
    }

    /// Hands the export to an upload collaborator. Failures are reported,
    /// never retried.
    pub fn upload_export(&mut self, uploader: &dyn UploadProvider) -> Result<UploadReceipt> {
        let filename = export_filename(Utc::now());
        let png = encode_png(&self.render_export())?;
        let response = uploader.upload(&encode_png_data_url(&png), &filename);
        match response.into_result(&filename) {
            Ok(receipt) => {
                info!("uploaded {}", receipt.file_name);
                let message = match &receipt.share_link {
                    Some(link) => format!("Uploaded! Share link: {link}"),
                    None => "Uploaded!".to_string(),
                };
                self.notify(NotificationKind::Success, message);
                Ok(receipt)
            }
            Err(err) => {
                error!("{err}");
                self.notify(NotificationKind::Error, err.to_string());
                Err(err)
            }
        }
    }

    fn fit_to_viewport(&mut self) {
        let (width, height) = self.image.dimensions();
        self.scale = fit_scale(width, height, self.viewport);
        let (canvas_w, canvas_h) = canvas_size(width, height, self.scale);
        self.base = render::scaled_base(&self.image, canvas_w, canvas_h);
    }

    fn commit(&mut self, annotation: Annotation) {
        info!("commit {}", annotation.tool());
        self.annotations = self.annotations.pushed(annotation);
        self.history.push(self.annotations.clone());
    }

    fn commit_text_field(&mut self) {
        let Interaction::TextEntry(field) =
            std::mem::replace(&mut self.interaction, Interaction::Idle)
        else {
            return;
        };
        let text = field.value.trim();
        if text.is_empty() {
            debug!("empty text entry discarded");
            return;
        }
        self.commit(Annotation::Text {
            anchor: field.anchor,
            color: self.color,
            text: text.to_string(),
            font: self.config.text_font.clone(),
        });
        self.redraw();
    }

    fn redraw(&mut self) {
        self.frame = render::compose(
            &self.base,
            self.scale,
            self.annotations.iter(),
            self.provisional(),
            &self.style,
        );
        self.frames_rendered += 1;
    }

    fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        self.notifications.push(Notification {
            message: message.into(),
            kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    use crate::export::DirectorySink;
    use crate::handoff::{stash_capture, MemoryStore};
    use crate::upload::UploadResponse;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn editor(w: u32, h: u32, viewport: Viewport) -> Editor {
        Editor::new(
            RgbaImage::from_pixel(w, h, WHITE),
            viewport,
            EditorConfig::default(),
        )
        .unwrap()
    }

    fn drag(editor: &mut Editor, from: (f64, f64), to: (f64, f64)) {
        editor.pointer_down(Point::new(from.0, from.1));
        editor.pointer_move(Point::new((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0));
        editor.pointer_up(Point::new(to.0, to.1));
    }

    #[test]
    fn fits_large_image_into_viewport() {
        let editor = editor(1000, 800, Viewport::new(600, 400));
        assert_eq!(editor.scale(), 0.5);
        assert_eq!(editor.canvas_size(), (500, 400));
        assert_eq!(editor.history_len(), 1);
        assert_eq!(editor.frames_rendered(), 1);
    }

    #[test]
    fn arrow_drag_is_stored_in_image_space() {
        let mut editor = editor(1000, 800, Viewport::new(600, 400));
        editor.select_tool(Tool::Arrow).unwrap();
        drag(&mut editor, (50.0, 50.0), (100.0, 75.0));

        assert_eq!(
            editor.annotations().to_vec(),
            vec![Annotation::Arrow {
                start: Point::new(100.0, 100.0),
                end: Point::new(200.0, 150.0),
                color: Color::RED,
            }]
        );
        assert_eq!(editor.history_len(), 2);
        assert_eq!(editor.state(), InteractionState::Idle);
    }

    #[test]
    fn small_drags_are_discarded() {
        let mut editor = editor(400, 300, Viewport::new(800, 600));
        editor.select_tool(Tool::Highlight).unwrap();
        drag(&mut editor, (10.0, 10.0), (15.0, 15.0));
        assert!(editor.annotations().is_empty());
        assert_eq!(editor.history_len(), 1);

        drag(&mut editor, (10.0, 10.0), (16.0, 12.0));
        assert_eq!(editor.annotations().len(), 1);
        assert_eq!(editor.history_len(), 2);
    }

    #[test]
    fn drag_preview_renders_and_sets_drawing_cursor() {
        let mut editor = editor(400, 300, Viewport::new(800, 600));
        editor.select_tool(Tool::Highlight).unwrap();
        editor.pointer_down(Point::new(100.0, 100.0));
        assert!(editor.cursor().drawing);
        let before = editor.frames_rendered();
        editor.pointer_move(Point::new(200.0, 200.0));
        assert_eq!(editor.frames_rendered(), before + 1);
        assert_eq!(editor.state(), InteractionState::Dragging);

        let px = *editor.frame().get_pixel(100, 100);
        assert_eq!(px[0], 255);
        assert!(px[1] > 0 && px[1] < 255, "preview should be translucent: {px:?}");
        assert!(editor.annotations().is_empty());
    }

    #[test]
    fn pointer_leave_commits_like_pointer_up() {
        let mut editor = editor(400, 300, Viewport::new(800, 600));
        editor.pointer_down(Point::new(10.0, 10.0));
        editor.pointer_leave(Point::new(120.0, 90.0));
        assert_eq!(editor.annotations().len(), 1);
        assert!(!editor.cursor().drawing);

        // Leaving while idle does nothing.
        editor.pointer_leave(Point::new(0.0, 0.0));
        assert_eq!(editor.annotations().len(), 1);
    }

    #[test]
    fn color_change_only_affects_new_annotations() {
        let mut editor = editor(400, 300, Viewport::new(800, 600));
        drag(&mut editor, (10.0, 10.0), (100.0, 100.0));
        let blue = Color::rgb(0x21, 0x96, 0xF3);
        editor.select_color(blue).unwrap();
        drag(&mut editor, (10.0, 50.0), (100.0, 150.0));
        let colors: Vec<Color> = editor.annotations().iter().map(Annotation::color).collect();
        assert_eq!(colors, vec![Color::RED, blue]);
        assert!(editor.select_color(Color::rgb(1, 2, 3)).is_err());
    }

    #[test]
    fn text_entry_commits_on_enter() {
        let mut editor = editor(1000, 800, Viewport::new(600, 400));
        editor.select_tool(Tool::Text).unwrap();
        editor.pointer_down(Point::new(30.0, 40.0));
        assert_eq!(editor.state(), InteractionState::TextEntry);
        assert!(!editor.cursor().drawing);
        let field = editor.text_field().unwrap();
        assert_eq!(field.anchor(), Point::new(60.0, 80.0));
        assert_eq!(field.screen_position(), Point::new(30.0, 40.0));

        editor.set_text("  Hi  ");
        editor.text_key(TextKey::Enter);
        assert_eq!(editor.state(), InteractionState::Idle);
        match editor.annotations().last() {
            Some(Annotation::Text { anchor, text, font, .. }) => {
                assert_eq!(*anchor, Point::new(60.0, 80.0));
                assert_eq!(text, "Hi");
                assert_eq!(font.to_string(), "16px Arial");
            }
            other => panic!("expected text annotation, got {other:?}"),
        }
        assert_eq!(editor.history_len(), 2);
    }

    #[test]
    fn escape_cancels_text_entry() {
        let mut editor = editor(400, 300, Viewport::new(800, 600));
        editor.select_tool(Tool::Text).unwrap();
        editor.pointer_down(Point::new(30.0, 40.0));
        editor.set_text("Hi");
        editor.text_key(TextKey::Escape);
        assert!(editor.annotations().is_empty());
        assert_eq!(editor.history_len(), 1);
        assert!(editor.text_field().is_none());
    }

    #[test]
    fn empty_text_is_silently_dropped() {
        let mut editor = editor(400, 300, Viewport::new(800, 600));
        editor.select_tool(Tool::Text).unwrap();
        editor.pointer_down(Point::new(30.0, 40.0));
        editor.set_text("   ");
        editor.text_key(TextKey::Enter);
        assert!(editor.annotations().is_empty());
        assert_eq!(editor.state(), InteractionState::Idle);
    }

    #[test]
    fn blur_commits_after_grace_unless_refocused() {
        let mut editor = editor(400, 300, Viewport::new(800, 600));
        editor.select_tool(Tool::Text).unwrap();
        editor.pointer_down(Point::new(30.0, 40.0));
        editor.set_text("note");

        let t0 = Instant::now();
        editor.text_blur(t0);
        editor.text_focus();
        editor.tick(t0 + Duration::from_millis(500));
        assert_eq!(editor.state(), InteractionState::TextEntry);

        editor.text_blur(t0);
        editor.tick(t0 + Duration::from_millis(100));
        assert!(editor.annotations().is_empty());
        editor.tick(t0 + Duration::from_millis(150));
        assert_eq!(editor.annotations().len(), 1);
        assert_eq!(editor.state(), InteractionState::Idle);
    }

    #[test]
    fn new_text_field_replaces_unsaved_one() {
        let mut editor = editor(400, 300, Viewport::new(800, 600));
        editor.select_tool(Tool::Text).unwrap();
        editor.pointer_down(Point::new(30.0, 40.0));
        editor.set_text("first");
        editor.pointer_down(Point::new(90.0, 90.0));
        assert_eq!(editor.text_field().unwrap().value(), "");
        editor.set_text("second");
        editor.text_key(TextKey::Enter);
        assert_eq!(editor.annotations().len(), 1);
        assert!(matches!(
            editor.annotations().last(),
            Some(Annotation::Text { text, .. }) if text == "second"
        ));
    }

    #[test]
    fn undo_walks_back_to_empty() {
        let mut editor = editor(400, 300, Viewport::new(800, 600));
        let mut committed = Vec::new();
        for i in 0..3 {
            let y = 10.0 + f64::from(i) * 40.0;
            drag(&mut editor, (10.0, y), (100.0, y + 30.0));
            committed.push(editor.annotations().to_vec());
        }
        assert_eq!(editor.annotations().len(), 3);
        assert_eq!(committed[2][..2], committed[1][..]);
        for expected in [2, 1, 0] {
            assert!(editor.undo());
            let restored = editor.annotations().to_vec();
            assert_eq!(restored, committed[2][..expected]);
            if expected > 0 {
                assert_eq!(restored, committed[expected - 1]);
            }
        }
        // Only the starting snapshot is left; undoing it keeps the empty state.
        assert!(editor.undo());
        assert!(editor.annotations().is_empty());
        assert!(!editor.undo());
    }

    #[test]
    fn far_off_surface_pointer_stays_cheap() {
        let mut editor = editor(100, 100, Viewport::new(100, 100));
        let started = Instant::now();
        editor.pointer_down(Point::new(10.0, 10.0));
        editor.pointer_move(Point::new(1e9, 10.0));
        editor.pointer_up(Point::new(1e9, 10.0));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(editor.annotations().len(), 1);
        assert_ne!(*editor.frame().get_pixel(99, 10), WHITE);
        assert_eq!(*editor.frame().get_pixel(50, 50), WHITE);
    }

    #[test]
    fn history_saturates_after_sixty_commits() {
        let mut editor = editor(400, 300, Viewport::new(800, 600));
        editor.select_tool(Tool::Highlight).unwrap();
        for _ in 0..60 {
            drag(&mut editor, (10.0, 10.0), (100.0, 100.0));
        }
        assert_eq!(editor.annotations().len(), 60);
        assert_eq!(editor.history_len(), 50);
        for _ in 0..49 {
            editor.undo();
        }
        assert_eq!(editor.annotations().len(), 11);
        editor.undo();
        assert!(editor.annotations().is_empty());
    }

    #[test]
    fn text_tool_missing_from_arrow_only_variant() {
        let config = EditorConfig {
            text_tool: false,
            ..EditorConfig::default()
        };
        let mut editor =
            Editor::new(RgbaImage::from_pixel(10, 10, WHITE), Viewport::new(10, 10), config)
                .unwrap();
        assert!(matches!(
            editor.select_tool(Tool::Text),
            Err(EditorError::ToolUnavailable(Tool::Text))
        ));
        assert_eq!(editor.active_tool(), Tool::Arrow);
    }

    #[test]
    fn resize_refits_and_rerenders() {
        let mut editor = editor(1000, 800, Viewport::new(600, 400));
        drag(&mut editor, (50.0, 50.0), (100.0, 75.0));
        let frames = editor.frames_rendered();
        editor.resize(Viewport::new(2000, 2000));
        assert_eq!(editor.scale(), 1.0);
        assert_eq!(editor.canvas_size(), (1000, 800));
        assert_eq!(editor.frames_rendered(), frames + 1);
        assert_eq!(*editor.frame().get_pixel(100, 100), Color::RED.to_rgba());
    }

    #[test]
    fn export_is_native_resolution_without_preview() {
        let mut editor = editor(1000, 800, Viewport::new(600, 400));
        drag(&mut editor, (50.0, 50.0), (100.0, 75.0));
        editor.select_tool(Tool::Highlight).unwrap();
        editor.pointer_down(Point::new(300.0, 300.0));
        editor.pointer_move(Point::new(400.0, 380.0));

        let export = editor.render_export();
        assert_eq!(export.dimensions(), (1000, 800));
        assert_eq!(*export.get_pixel(100, 100), Color::RED.to_rgba());
        assert_eq!(*export.get_pixel(600, 600), WHITE);
        assert_eq!(editor.annotations().len(), 1);
    }

    struct FailingClipboard;

    impl ClipboardSink for FailingClipboard {
        fn write_image(&mut self, _image: &RgbaImage, _png: &[u8]) -> Result<()> {
            Err(EditorError::Clipboard("no display".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingClipboard {
        sizes: Vec<(u32, u32)>,
    }

    impl ClipboardSink for RecordingClipboard {
        fn write_image(&mut self, image: &RgbaImage, png: &[u8]) -> Result<()> {
            assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
            self.sizes.push(image.dimensions());
            Ok(())
        }
    }

    #[test]
    fn clipboard_failure_is_notified_and_harmless() {
        let mut editor = editor(400, 300, Viewport::new(800, 600));
        drag(&mut editor, (10.0, 10.0), (100.0, 100.0));
        assert!(editor.copy_to_clipboard(&mut FailingClipboard).is_err());
        assert_eq!(
            editor.take_notifications(),
            vec![Notification {
                message: "Failed to copy to clipboard".to_string(),
                kind: NotificationKind::Error,
            }]
        );
        assert_eq!(editor.annotations().len(), 1);
        assert_eq!(editor.history_len(), 2);

        let mut clipboard = RecordingClipboard::default();
        editor.copy_to_clipboard(&mut clipboard).unwrap();
        assert_eq!(clipboard.sizes, vec![(400, 300)]);
        assert_eq!(editor.take_notifications()[0].kind, NotificationKind::Success);
    }

    #[test]
    fn download_writes_timestamped_png() {
        let dir = tempdir().unwrap();
        let mut editor = editor(40, 30, Viewport::new(800, 600));
        let mut sink = DirectorySink::new(dir.path());
        let path = editor.download(&mut sink).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("screenshot-") && name.ends_with(".png"), "{name}");
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
        assert_eq!(editor.take_notifications()[0].message, "Screenshot saved!");
    }

    struct StubUploader(UploadResponse);

    impl UploadProvider for StubUploader {
        fn upload(&self, data_url: &str, filename: &str) -> UploadResponse {
            assert!(data_url.starts_with("data:image/png;base64,"));
            assert!(filename.ends_with(".png"));
            self.0.clone()
        }
    }

    #[test]
    fn upload_reports_link_or_reason() {
        let mut editor = editor(40, 30, Viewport::new(800, 600));
        let ok = StubUploader(UploadResponse {
            success: true,
            share_link: Some("https://share/1".to_string()),
            ..UploadResponse::default()
        });
        let receipt = editor.upload_export(&ok).unwrap();
        assert_eq!(receipt.share_link.as_deref(), Some("https://share/1"));

        let denied = StubUploader(UploadResponse::failed("auth denied"));
        let err = editor.upload_export(&denied).unwrap_err();
        assert!(matches!(err, EditorError::Upload(reason) if reason == "auth denied"));
        let notes = editor.take_notifications();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1].kind, NotificationKind::Error);
    }

    #[test]
    fn opens_from_capture_hand_off() {
        let png = encode_png(&RgbaImage::from_pixel(20, 10, WHITE)).unwrap();
        let captured = CapturedImage {
            png,
            width: 20,
            height: 10,
            page: PageInfo {
                url: "https://example.com".to_string(),
                title: "Example".to_string(),
                ..PageInfo::default()
            },
        };
        let mut store = MemoryStore::default();
        stash_capture(&mut store, &captured).unwrap();
        let editor =
            Editor::from_store(&store, Viewport::new(100, 100), EditorConfig::default()).unwrap();
        assert_eq!(editor.image().dimensions(), (20, 10));
        assert_eq!(editor.page().unwrap().title, "Example");

        let empty = MemoryStore::default();
        assert!(matches!(
            Editor::from_store(&empty, Viewport::new(100, 100), EditorConfig::default()),
            Err(EditorError::MissingCapture)
        ));
    }

    #[test]
    fn empty_image_is_rejected() {
        let result = Editor::new(RgbaImage::new(0, 0), Viewport::new(10, 10), EditorConfig::default());
        assert!(matches!(result, Err(EditorError::EmptyImage { .. })));
    }
}
