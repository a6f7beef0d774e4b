use super::frame::{PostFrame, ViewKind};
use super::settings::{PostSettings, SettingsError};
use super::solution::{
    FieldId, FieldSolutionId, SolutionMode, SolutionSampler, VariableComp, VariableInfo,
    VariableKind,
};
use crate::post::colorbar::ColorBar;
use crate::post::contour::extract_contours;
use crate::post::palette::{LookupTable, PaletteError};
use crate::post::patch::{sample_patches_parallel, RenderTriangle, SampledField, ValueRange};
use crate::post::vectors::{
    grid_step, magnitude_range, sample_vector_field, zip_components, GlyphParams,
    VectorGlyphSample,
};

use log::{debug, info, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// The (field, time step, adaptivity step, mode) tuple the views are computed for
///
/// Steps stay `None` until they are resolved against the solver.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActiveViewSelection {
    pub field: Option<FieldId>,
    pub time_step: Option<usize>,
    pub adaptivity_step: Option<usize>,
    pub mode: SolutionMode,
}

impl ActiveViewSelection {
    /// The stored solution this selection points to, if fully resolved
    pub fn solution_id(&self) -> Option<FieldSolutionId> {
        Some(FieldSolutionId {
            field: self.field.clone()?,
            time_step: self.time_step?,
            adaptivity_step: self.adaptivity_step?,
            mode: self.mode,
        })
    }
}

/// Notifications from the host application about the state of the problem
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostEvent {
    /// The problem was cleared
    Cleared,
    /// Fields were added to or removed from the problem
    FieldsChanged,
    /// Stored solutions were discarded
    ClearedSolution,
    Meshed,
    Solved,
}

type ProcessedListener = Box<dyn FnMut(&PostFrame)>;

/// Tracks which solution is displayed and owns the derived views computed from it
pub struct ViewController {
    settings: PostSettings,
    selection: ActiveViewSelection,
    frame: Arc<PostFrame>,
    lookup_table: Option<LookupTable>,
    processed: bool,
    busy: bool,
    listeners: Vec<ProcessedListener>,
}

impl ViewController {
    pub fn new(settings: PostSettings) -> Result<Self, SettingsError> {
        settings.validate()?;

        Ok(Self {
            settings,
            selection: ActiveViewSelection::default(),
            frame: Arc::new(PostFrame::empty()),
            lookup_table: None,
            processed: false,
            busy: false,
            listeners: Vec::new(),
        })
    }

    pub fn settings(&self) -> &PostSettings {
        &self.settings
    }

    /// Replace the configuration; takes effect on the next `refresh`
    pub fn set_settings(&mut self, settings: PostSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    pub fn selection(&self) -> &ActiveViewSelection {
        &self.selection
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Register a listener fired once at the end of every completed `refresh`
    pub fn on_processed(&mut self, listener: impl FnMut(&PostFrame) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ----------------------------------------------------------------------------------------------------
    // Selection
    // ----------------------------------------------------------------------------------------------------

    pub fn handle_event(&mut self, event: PostEvent, sampler: &dyn SolutionSampler) {
        debug!("Post event: {:?}", event);

        match event {
            PostEvent::Cleared | PostEvent::FieldsChanged => self.clear(),
            PostEvent::ClearedSolution => self.clear_view(),
            PostEvent::Meshed => {
                if self.selection.field.is_none() {
                    self.select_first_field(sampler);
                }
            }
            PostEvent::Solved => self.resolve_solved(sampler),
        }
    }

    /// Make `field` the active field
    ///
    /// Switching to a different field unresolves both steps, resets the mode to `Normal`, and re-derives the scalar,
    /// contour and vector variables (keeping each configured variable the new field still offers).
    pub fn set_active_field(&mut self, field: FieldId, sampler: &dyn SolutionSampler) {
        if self.selection.field.as_ref() == Some(&field) {
            return;
        }
        debug!("Active view field: {}", field);

        let variables = sampler.available_variables(&field);
        let default_scalar = sampler.default_scalar_variable(&field);
        let default_vector = sampler.default_vector_variable(&field);

        let settings = &mut self.settings;

        if offered(&variables, &settings.scalar_variable, None).is_none() {
            settings.scalar_component = default_scalar
                .as_ref()
                .map(|v| VariableComp::for_contour(v.kind))
                .unwrap_or_default();
            settings.scalar_variable = default_scalar.as_ref().map(|v| v.id.clone());
        }

        settings.contour_variable = offered(&variables, &settings.contour_variable, None)
            .or_else(|| default_scalar.as_ref().map(|v| v.id.clone()));

        settings.vector_variable =
            offered(&variables, &settings.vector_variable, Some(VariableKind::Vector))
                .or_else(|| default_vector.as_ref().map(|v| v.id.clone()));

        self.selection = ActiveViewSelection {
            field: Some(field),
            time_step: None,
            adaptivity_step: None,
            mode: SolutionMode::Normal,
        };
    }

    pub fn set_active_time_step(&mut self, time_step: usize) {
        self.selection.time_step = Some(time_step);
    }

    pub fn set_active_adaptivity_step(&mut self, adaptivity_step: usize) {
        self.selection.adaptivity_step = Some(adaptivity_step);
    }

    pub fn set_active_solution_mode(&mut self, mode: SolutionMode) {
        self.selection.mode = mode;
    }

    fn select_first_field(&mut self, sampler: &dyn SolutionSampler) {
        match sampler.field_ids().into_iter().next() {
            Some(field) => self.set_active_field(field, sampler),
            None => warn!("Problem has no fields; Cannot select an active view field!"),
        }
    }

    fn resolve_solved(&mut self, sampler: &dyn SolutionSampler) {
        if self.selection.field.is_none() {
            self.select_first_field(sampler);
        }
        let field = match self.selection.field.clone() {
            Some(field) => field,
            None => return,
        };

        let time_step = sampler.last_time_step(&field, SolutionMode::Normal);
        self.selection.time_step = time_step;
        self.selection.adaptivity_step = time_step
            .and_then(|ts| sampler.last_adaptive_step(&field, SolutionMode::Normal, ts));
        self.selection.mode = SolutionMode::Normal;

        debug!(
            "Resolved view selection: {:?} (time step: {:?}, adaptivity step: {:?})",
            field.as_str(),
            self.selection.time_step,
            self.selection.adaptivity_step
        );
    }

    /// Drop the selection and every derived view
    pub fn clear(&mut self) {
        self.clear_view();
        self.selection = ActiveViewSelection::default();
    }

    /// Drop the derived views (the selection is kept)
    pub fn clear_view(&mut self) {
        self.processed = false;
        self.frame = Arc::new(PostFrame::empty());
    }

    // ----------------------------------------------------------------------------------------------------
    // Processing
    // ----------------------------------------------------------------------------------------------------

    /// Recompute the contour, scalar and vector views for the active selection and publish them as a new frame
    ///
    /// Selections without a stored solution produce an empty frame. Listeners are notified either way. A refresh
    /// requested while another one is running is ignored. A panic raised while processing (malformed patches from
    /// the solver, a panicking listener) is propagated, and the controller accepts the next refresh.
    pub fn refresh(&mut self, sampler: &dyn SolutionSampler) {
        if self.busy {
            warn!("Post-processing is already running; Ignoring refresh request!");
            return;
        }
        self.busy = true;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.publish_frame(sampler)));
        self.busy = false;

        if let Err(payload) = outcome {
            warn!("Post-processing was interrupted by a panic!");
            panic::resume_unwind(payload);
        }
    }

    fn publish_frame(&mut self, sampler: &dyn SolutionSampler) {
        self.clear_view();

        let frame = match self.selection.solution_id() {
            Some(solution) if sampler.solution_exists(&solution) => {
                self.process_solution(solution, sampler)
            }
            Some(solution) => {
                debug!("No stored solution for {}", solution);
                PostFrame::empty()
            }
            None => PostFrame::empty(),
        };

        self.frame = Arc::new(frame);
        self.processed = true;

        for listener in self.listeners.iter_mut() {
            listener(self.frame.as_ref());
        }
    }

    fn process_solution(
        &mut self,
        solution: FieldSolutionId,
        sampler: &dyn SolutionSampler,
    ) -> PostFrame {
        let mut frame = PostFrame {
            solution: Some(solution.clone()),
            ..PostFrame::empty()
        };

        if self.settings.show_contour_view {
            if let Some(variable) =
                self.view_variable(&solution, &self.settings.contour_variable, sampler)
            {
                info!("Post View: Contour view ({})", variable.id);

                let comp = VariableComp::for_contour(variable.kind);
                frame.contour = self.sample(&solution, &variable, comp, sampler);
                if !frame.contour.is_empty() {
                    frame.contours = extract_contours(
                        &frame.contour,
                        self.settings.contours_count,
                        &frame.contour.range,
                    );
                }
            }
        }

        if self.settings.show_scalar_view {
            if let Some(variable) =
                self.view_variable(&solution, &self.settings.scalar_variable, sampler)
            {
                info!("Post View: Scalar view ({})", variable.id);

                frame.scalar =
                    self.sample(&solution, &variable, self.settings.scalar_component, sampler);

                if self.settings.scalar_range_auto && !frame.scalar.range.is_empty() {
                    self.settings.scalar_range_min = frame.scalar.range.min;
                    self.settings.scalar_range_max = frame.scalar.range.max;
                }

                if self.settings.show_scalar_color_bar {
                    frame.color_bar = self.color_bar(&variable);
                }
            }
        }

        if self.settings.show_vector_view {
            if let Some(variable) =
                self.view_variable(&solution, &self.settings.vector_variable, sampler)
            {
                if variable.kind == VariableKind::Vector {
                    info!("Post View: Vector view ({})", variable.id);

                    let (vectors, range) = self.vector_view(&solution, &variable, sampler);
                    frame.vectors = vectors;
                    frame.vector_range = range;
                } else {
                    warn!(
                        "Variable '{}' is not a vector; Cannot build Vector view!",
                        variable.id
                    );
                }
            }
        }

        frame
    }

    fn view_variable(
        &self,
        solution: &FieldSolutionId,
        id: &Option<String>,
        sampler: &dyn SolutionSampler,
    ) -> Option<VariableInfo> {
        let id = id.as_deref()?;
        let variable = sampler.variable(&solution.field, id);
        if variable.is_none() {
            warn!("Field '{}' has no variable '{}'; Skipping view!", solution.field, id);
        }
        variable
    }

    fn sample(
        &self,
        solution: &FieldSolutionId,
        variable: &VariableInfo,
        comp: VariableComp,
        sampler: &dyn SolutionSampler,
    ) -> SampledField {
        let patches = sampler.patches(
            solution,
            &variable.id,
            comp,
            self.settings.patch_subdivisions,
        );
        sample_patches_parallel(&patches)
    }

    fn vector_view(
        &self,
        solution: &FieldSolutionId,
        variable: &VariableInfo,
        sampler: &dyn SolutionSampler,
    ) -> (Vec<VectorGlyphSample>, ValueRange) {
        let x = self.sample(solution, variable, VariableComp::X, sampler);
        let y = self.sample(solution, variable, VariableComp::Y, sampler);
        if x.triangles.len() != y.triangles.len() {
            warn!(
                "Vector components of '{}' disagree on the mesh; Cannot build Vector view!",
                variable.id
            );
            return (Vec::new(), ValueRange::empty());
        }

        let triangles = zip_components(&x, &y);
        let range = magnitude_range(&triangles);

        let params = GlyphParams {
            grid_step: grid_step(&sampler.bounding_box(), self.settings.vector_count),
            scale: self.settings.vector_scale,
            proportional: self.settings.vector_proportional,
            range,
        };

        (sample_vector_field(&triangles, &params), range)
    }

    fn color_bar(&mut self, variable: &VariableInfo) -> Option<ColorBar> {
        let range = ValueRange::new(
            self.settings.scalar_range_min,
            self.settings.scalar_range_max,
        );
        let scale = self.settings.tick_scale();
        let decimal_places = self.settings.scalar_decimal_places;

        match self.palette_lookup_table() {
            Ok(table) => Some(ColorBar::new(
                &range,
                table,
                scale,
                decimal_places,
                Some((&variable.short_name, &variable.unit)),
            )),
            Err(err) => {
                warn!("{}", err);
                None
            }
        }
    }

    // ----------------------------------------------------------------------------------------------------
    // Published data
    // ----------------------------------------------------------------------------------------------------

    /// The last published frame
    pub fn current_frame(&self) -> Arc<PostFrame> {
        Arc::clone(&self.frame)
    }

    pub fn current_triangles(&self, kind: ViewKind) -> &[RenderTriangle] {
        self.frame.triangles(kind)
    }

    pub fn current_range(&self, kind: ViewKind) -> ValueRange {
        self.frame.range(kind)
    }

    pub fn current_vector_samples(&self) -> &[VectorGlyphSample] {
        &self.frame.vectors
    }

    /// Lookup table for the configured palette, rebuilt only when the palette settings change
    ///
    /// With the palette filter on, the table always carries `FILTERED_PALETTE_STEPS` steps
    pub fn palette_lookup_table(&mut self) -> Result<&LookupTable, PaletteError> {
        let style = self.settings.palette_style;
        let steps = self.settings.effective_palette_steps();
        let filter = self.settings.palette_filter;

        let table = match self.lookup_table.take() {
            Some(table) if table.matches(style, steps, filter) => table,
            _ => LookupTable::build(style, steps, filter)?,
        };

        Ok(self.lookup_table.insert(table))
    }
}

// id of the configured variable, if the field offers it (with the right kind)
fn offered(
    variables: &[VariableInfo],
    configured: &Option<String>,
    kind: Option<VariableKind>,
) -> Option<String> {
    let id = configured.as_deref()?;
    variables
        .iter()
        .find(|v| v.id == id && kind.map_or(true, |k| v.kind == k))
        .map(|v| v.id.clone())
}
