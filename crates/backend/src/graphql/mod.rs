use std::sync::Arc;

use async_graphql::{Context, Enum, InputObject, Object, SimpleObject, ID};
use mangrove_shared::{
    coordinator::RenderFailure,
    domain::SelectorDomain,
    error::ErrorKind,
    legend,
    models::{self, LegendSpec, Mode, SelectorKey, ViewState, VisualizationSpec},
    render::LayerRequest,
    Catalog, RenderCoordinator, RenderInstruction,
};

use crate::presenter::Presenter;
use crate::storage::Storage;

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum GqlMode {
    LandCover,
    ChangeDetection,
}

impl From<Mode> for GqlMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::LandCover => GqlMode::LandCover,
            Mode::ChangeDetection => GqlMode::ChangeDetection,
        }
    }
}

impl From<GqlMode> for Mode {
    fn from(m: GqlMode) -> Self {
        match m {
            GqlMode::LandCover => Mode::LandCover,
            GqlMode::ChangeDetection => Mode::ChangeDetection,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum GqlErrorKind {
    UnknownSelectorKey,
    AssetUnavailable,
    UnsupportedMode,
    Render,
    InvalidViewState,
}

impl From<ErrorKind> for GqlErrorKind {
    fn from(k: ErrorKind) -> Self {
        match k {
            ErrorKind::UnknownSelectorKey => GqlErrorKind::UnknownSelectorKey,
            ErrorKind::AssetUnavailable => GqlErrorKind::AssetUnavailable,
            ErrorKind::UnsupportedMode => GqlErrorKind::UnsupportedMode,
            ErrorKind::Render => GqlErrorKind::Render,
            ErrorKind::InvalidViewState => GqlErrorKind::InvalidViewState,
        }
    }
}

// GraphQL output types

#[derive(SimpleObject)]
pub struct GqlModeInfo {
    pub mode: GqlMode,
    pub id: String,
    pub label: String,
}

#[derive(SimpleObject)]
pub struct GqlSelectorOption {
    pub key: String,
    pub label: String,
}

#[derive(SimpleObject)]
pub struct GqlDomain {
    pub mode: GqlMode,
    pub options: Vec<GqlSelectorOption>,
    pub default_key: String,
    /// Key the dropdown should show, if any.
    pub selected: Option<String>,
}

impl GqlDomain {
    fn new(domain: SelectorDomain, selected: Option<SelectorKey>) -> Self {
        GqlDomain {
            mode: domain.mode.into(),
            options: domain
                .options
                .into_iter()
                .map(|o| GqlSelectorOption {
                    key: o.key.to_string(),
                    label: o.label,
                })
                .collect(),
            default_key: domain.default.to_string(),
            selected: selected.map(|k| k.to_string()),
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlVisualization {
    pub min: i32,
    pub max: i32,
    pub palette: Vec<String>,
    pub direct: bool,
}

impl From<VisualizationSpec> for GqlVisualization {
    fn from(v: VisualizationSpec) -> Self {
        GqlVisualization {
            direct: v.mapping == models::PaletteMapping::Direct,
            min: v.min,
            max: v.max,
            palette: v.palette,
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlLegendEntry {
    pub label: String,
    pub color: String,
    pub value: i32,
}

#[derive(SimpleObject)]
pub struct GqlLegend {
    pub title: String,
    pub entries: Vec<GqlLegendEntry>,
    pub html: String,
}

impl From<LegendSpec> for GqlLegend {
    fn from(l: LegendSpec) -> Self {
        let html = legend::render_html(&l);
        let entries = legend::render(&l)
            .into_iter()
            .map(|s| GqlLegendEntry {
                label: s.label,
                color: s.color,
                value: s.class_value,
            })
            .collect();
        GqlLegend {
            title: l.title,
            entries,
            html,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct GqlViewState {
    pub lat: f64,
    pub lng: f64,
    pub zoom: u32,
}

impl From<ViewState> for GqlViewState {
    fn from(v: ViewState) -> Self {
        GqlViewState {
            lat: v.center.lat,
            lng: v.center.lng,
            zoom: v.zoom as u32,
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlResolution {
    pub asset_reference: String,
    pub layer_name: String,
    pub visualization: GqlVisualization,
    pub legend: GqlLegend,
}

#[derive(SimpleObject)]
pub struct GqlLayer {
    /// Standalone map page for an iframe.
    pub html: String,
    pub asset_reference: String,
    pub layer_name: String,
    pub visualization: GqlVisualization,
    pub view: GqlViewState,
}

impl GqlLayer {
    fn new(request: LayerRequest, html: String) -> Self {
        GqlLayer {
            html,
            asset_reference: request.asset.to_string(),
            layer_name: request.layer_name,
            visualization: request.visualization.into(),
            view: request.view.into(),
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlRenderError {
    pub kind: GqlErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl From<RenderFailure> for GqlRenderError {
    fn from(f: RenderFailure) -> Self {
        GqlRenderError {
            kind: f.kind.into(),
            message: f.message,
            retryable: f.retryable,
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlSession {
    pub id: ID,
    pub mode: Option<GqlMode>,
    pub key: Option<String>,
    pub view: GqlViewState,
    pub created_at: String,
    pub updated_at: String,
}

impl From<models::Session> for GqlSession {
    fn from(s: models::Session) -> Self {
        GqlSession {
            id: ID(s.id.to_string()),
            mode: s.snapshot.mode.map(GqlMode::from),
            key: s.snapshot.key.map(|k| k.to_string()),
            view: s.snapshot.view.into(),
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Everything one event changed. Absent panels are left as they are.
#[derive(SimpleObject)]
pub struct GqlRenderCycle {
    pub session: GqlSession,
    pub domain: Option<GqlDomain>,
    pub legend: Option<GqlLegend>,
    pub layer: Option<GqlLayer>,
    pub error: Option<GqlRenderError>,
}

impl GqlRenderCycle {
    /// Apply instructions in order, presenting each layer as it comes.
    fn build(
        session: models::Session,
        instructions: Vec<RenderInstruction>,
        presenter: &Presenter,
    ) -> Self {
        let mut cycle = GqlRenderCycle {
            session: session.into(),
            domain: None,
            legend: None,
            layer: None,
            error: None,
        };
        for instruction in instructions {
            match instruction {
                RenderInstruction::Domain { domain, selected } => {
                    cycle.domain = Some(GqlDomain::new(domain, selected));
                }
                RenderInstruction::Legend(l) => cycle.legend = Some(l.into()),
                RenderInstruction::Layer(request) => match presenter.present(&request) {
                    Ok(view) => {
                        cycle.layer = Some(GqlLayer::new(request, view.html));
                        cycle.error = None;
                    }
                    Err(err) => {
                        cycle.layer = None;
                        cycle.error = Some(RenderFailure::from(&err).into());
                    }
                },
                RenderInstruction::LayerError(failure) => {
                    cycle.layer = None;
                    cycle.error = Some(failure.into());
                }
            }
        }
        cycle
    }
}

#[derive(SimpleObject)]
pub struct GqlStats {
    pub total_sessions: u64,
    pub db_size_bytes: u64,
}

// Input types

#[derive(InputObject)]
pub struct ViewInput {
    pub lat: f64,
    pub lng: f64,
    pub zoom: u32,
}

/// Restore the session's coordinator, run one event, store the new snapshot.
fn apply_event<T>(
    ctx: &Context<'_>,
    session_id: &str,
    event: impl FnOnce(&mut RenderCoordinator) -> T,
) -> async_graphql::Result<(models::Session, T)> {
    let storage = ctx.data::<Arc<Storage>>()?;
    let catalog = ctx.data::<Arc<Catalog>>()?;
    storage
        .update_session(session_id, |session| {
            let mut coordinator = RenderCoordinator::restore(catalog.clone(), &session.snapshot);
            let out = event(&mut coordinator);
            session.snapshot = coordinator.snapshot();
            out
        })
        .map_err(async_graphql::Error::new)?
        .ok_or_else(|| async_graphql::Error::new("Session not found"))
}

// Query root

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn modes(&self) -> Vec<GqlModeInfo> {
        Mode::ALL
            .iter()
            .map(|m| GqlModeInfo {
                mode: (*m).into(),
                id: m.id().to_string(),
                label: m.label().to_string(),
            })
            .collect()
    }

    async fn domain(&self, ctx: &Context<'_>, mode: GqlMode) -> async_graphql::Result<GqlDomain> {
        let catalog = ctx.data::<Arc<Catalog>>()?;
        let domain = catalog.domains().domain_for(mode.into());
        let default = domain.default;
        Ok(GqlDomain::new(domain, Some(default)))
    }

    async fn resolve(
        &self,
        ctx: &Context<'_>,
        mode: GqlMode,
        key: String,
    ) -> async_graphql::Result<GqlResolution> {
        let catalog = ctx.data::<Arc<Catalog>>()?;
        let mode: Mode = mode.into();
        let resolution = SelectorKey::parse_for(mode, &key)
            .and_then(|key| catalog.resolver().resolve(mode, key))
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(GqlResolution {
            asset_reference: resolution.asset.to_string(),
            layer_name: resolution.layer_name,
            visualization: resolution.visualization.into(),
            legend: resolution.legend.into(),
        })
    }

    async fn legend(&self, ctx: &Context<'_>, mode: GqlMode) -> async_graphql::Result<GqlLegend> {
        let catalog = ctx.data::<Arc<Catalog>>()?;
        let legend = catalog
            .visuals()
            .legend(mode.into())
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(legend.clone().into())
    }

    async fn session(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Option<GqlSession>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let session = storage.get_session(&id).map_err(async_graphql::Error::new)?;
        Ok(session.map(GqlSession::from))
    }

    async fn stats(&self, ctx: &Context<'_>) -> async_graphql::Result<GqlStats> {
        let storage = ctx.data::<Arc<Storage>>()?;
        Ok(GqlStats {
            total_sessions: storage.count_sessions().map_err(async_graphql::Error::new)?,
            db_size_bytes: storage.db_size_bytes().map_err(async_graphql::Error::new)?,
        })
    }
}

// Mutation root

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Begin a session, or resume an existing one by redrawing its screen.
    async fn start_session(
        &self,
        ctx: &Context<'_>,
        session_id: Option<ID>,
    ) -> async_graphql::Result<GqlRenderCycle> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let presenter = ctx.data::<Arc<Presenter>>()?;

        if let Some(id) = session_id {
            if storage
                .get_session(&id)
                .map_err(async_graphql::Error::new)?
                .is_some()
            {
                let (session, out) = apply_event(ctx, &id, |c| c.start())?;
                return Ok(GqlRenderCycle::build(session, out, presenter));
            }
            tracing::debug!(session = %id.as_str(), "unknown session, starting a new one");
        }

        let now = chrono::Utc::now().to_rfc3339();
        let session = models::Session {
            id: uuid::Uuid::new_v4(),
            snapshot: models::SessionSnapshot {
                mode: None,
                key: None,
                view: ViewState::default(),
            },
            created_at: now.clone(),
            updated_at: now,
        };
        storage
            .save_session(&session)
            .map_err(async_graphql::Error::new)?;
        tracing::info!(session = %session.id, "session started");

        let (session, out) = apply_event(ctx, &session.id.to_string(), |c| c.start())?;
        Ok(GqlRenderCycle::build(session, out, presenter))
    }

    async fn select_mode(
        &self,
        ctx: &Context<'_>,
        session_id: ID,
        mode: GqlMode,
    ) -> async_graphql::Result<GqlRenderCycle> {
        let presenter = ctx.data::<Arc<Presenter>>()?;
        let (session, out) = apply_event(ctx, &session_id, |c| c.on_mode_changed(mode.into()))?;
        Ok(GqlRenderCycle::build(session, out, presenter))
    }

    /// `key` is the raw dropdown value, e.g. `2017` or `2017_2018`.
    async fn select_key(
        &self,
        ctx: &Context<'_>,
        session_id: ID,
        key: String,
    ) -> async_graphql::Result<GqlRenderCycle> {
        let presenter = ctx.data::<Arc<Presenter>>()?;
        let (session, out) = apply_event(ctx, &session_id, |c| c.on_selector_input(&key))?;
        Ok(GqlRenderCycle::build(session, out, presenter))
    }

    /// Record a pan/zoom gesture. Nothing is redrawn.
    async fn move_view(
        &self,
        ctx: &Context<'_>,
        session_id: ID,
        view: ViewInput,
    ) -> async_graphql::Result<GqlRenderCycle> {
        let presenter = ctx.data::<Arc<Presenter>>()?;
        let zoom = u8::try_from(view.zoom).unwrap_or(u8::MAX);
        let (session, moved) = apply_event(ctx, &session_id, |c| {
            c.on_view_state_changed(view.lat, view.lng, zoom)
        })?;
        moved.map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(GqlRenderCycle::build(session, Vec::new(), presenter))
    }

    /// Forget a session. Returns whether it existed.
    async fn end_session(&self, ctx: &Context<'_>, session_id: ID) -> async_graphql::Result<bool> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let removed = storage
            .delete_session(&session_id)
            .map_err(async_graphql::Error::new)?;
        if removed {
            tracing::info!(session = %session_id.as_str(), "session ended");
        }
        Ok(removed)
    }
}

pub type Schema = async_graphql::Schema<QueryRoot, MutationRoot, async_graphql::EmptySubscription>;

pub fn build_schema(catalog: Arc<Catalog>, storage: Arc<Storage>, presenter: Arc<Presenter>) -> Schema {
    async_graphql::Schema::build(QueryRoot, MutationRoot, async_graphql::EmptySubscription)
        .data(catalog)
        .data(storage)
        .data(presenter)
        .finish()
}
