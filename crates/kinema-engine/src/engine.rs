use std::cell::RefCell;
use std::rc::Rc;

use kinema_core::{KinemaConfig, KinemaError, KinemaResult};
use kinema_store::{ProjectId, ProjectSettings, Store, SubscriberId};

use crate::adapter::RendererAdapter;
use crate::backend::{SharedBackend, ViewSize};
use crate::component::ComponentBehavior;
use crate::context::EngineContext;
use crate::hierarchy::SceneNode;
use crate::player::{FrameScheduler, Player};
use crate::props::ComponentCore;

/// One editing session: the store, its runtime services, the renderer
/// adapter and the player, wired together.
///
/// Nothing here is global; several engines can live side by side.
pub struct Engine {
    config: KinemaConfig,
    ctx: EngineContext,
    project_id: ProjectId,
    adapter: Rc<RefCell<RendererAdapter>>,
    adapter_subscription: Option<SubscriberId>,
    player: Player,
    disposed: bool,
}

impl Engine {
    /// Initialize `backend`, create the project described by `config` and
    /// start observing it.
    pub fn new(
        config: KinemaConfig,
        backend: SharedBackend,
        scheduler: Box<dyn FrameScheduler>,
    ) -> KinemaResult<Self> {
        if config.project.fps == 0 {
            return Err(KinemaError::Config("project.fps must be positive".into()));
        }
        backend.borrow_mut().initialize(ViewSize {
            width: config.project.width,
            height: config.project.height,
        })?;

        let store = Rc::new(Store::new());
        let project_id = store.create_project(
            config.project.name.clone(),
            ProjectSettings::from(&config.project),
        );
        let ctx = EngineContext::new(store.clone(), backend);
        let (adapter, adapter_subscription) = RendererAdapter::attach(&ctx);
        let mut player = Player::new(store, scheduler);
        player.set_loop(config.playback.loop_playback);

        tracing::info!(
            project = %project_id,
            fps = config.project.fps,
            total_frames = config.project.total_frames,
            "engine initialized"
        );
        Ok(Self {
            config,
            ctx,
            project_id,
            adapter,
            adapter_subscription: Some(adapter_subscription),
            player,
            disposed: false,
        })
    }

    pub fn config(&self) -> &KinemaConfig {
        &self.config
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn store(&self) -> &Rc<Store> {
        &self.ctx.store
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn adapter(&self) -> &Rc<RefCell<RendererAdapter>> {
        &self.adapter
    }

    /// Add a scene to the project; the first one becomes current.
    pub fn create_scene(&self, name: &str) -> KinemaResult<Rc<SceneNode>> {
        self.ensure_live()?;
        SceneNode::create(&self.ctx, name)
    }

    /// The current scene. Fails until a scene has been created.
    pub fn current_scene(&self) -> KinemaResult<Rc<SceneNode>> {
        self.ensure_live()?;
        let id = self
            .ctx
            .store
            .with_state(|s| s.current_scene().map(|scene| scene.id.clone()))
            .ok_or_else(|| KinemaError::not_initialized("no scene has been created yet"))?;
        self.ctx
            .scene(&id)
            .ok_or_else(|| KinemaError::not_initialized("current scene is missing"))
    }

    /// Make a custom component type available to every game object.
    pub fn register_component(
        &self,
        type_tag: &str,
        factory: impl Fn(ComponentCore) -> Rc<dyn ComponentBehavior> + 'static,
    ) {
        self.ctx.registry.borrow_mut().register(type_tag, factory);
    }

    /// Start playback according to the config's autoplay flag.
    pub fn start(&mut self) {
        if self.config.playback.autoplay {
            self.player.play();
        }
    }

    /// Forward one frame-clock refresh to the player.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.player.tick(now_ms)
    }

    /// Detach from the store, drop all runtime wrappers and dispose the backend.
    pub fn dispose(&mut self) -> KinemaResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        self.player.stop();
        if let Some(subscription) = self.adapter_subscription.take() {
            self.ctx.store.unsubscribe(subscription);
        }
        self.ctx.directory.clear();
        tracing::info!(project = %self.project_id, "engine disposed");
        self.ctx.backend.borrow_mut().dispose()
    }

    fn ensure_live(&self) -> KinemaResult<()> {
        if self.disposed {
            return Err(KinemaError::not_initialized("engine has been disposed"));
        }
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            tracing::warn!(%err, "engine dispose failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::player::ManualScheduler;

    fn engine() -> (Engine, Rc<RefCell<RecordingBackend>>) {
        let backend = RecordingBackend::shared();
        let engine = Engine::new(
            KinemaConfig::default(),
            backend.clone(),
            Box::new(ManualScheduler::new()),
        )
        .unwrap();
        (engine, backend)
    }

    #[test]
    fn test_current_scene_before_creation_is_fatal() {
        let (engine, _) = engine();
        assert!(matches!(
            engine.current_scene(),
            Err(KinemaError::NotInitialized(_))
        ));
        let scene = engine.create_scene("main").unwrap();
        assert_eq!(engine.current_scene().unwrap().id, scene.id);
    }

    #[test]
    fn test_zero_fps_config_rejected() {
        let mut config = KinemaConfig::default();
        config.project.fps = 0;
        let result = Engine::new(config, RecordingBackend::shared(), Box::new(ManualScheduler::new()));
        assert!(matches!(result, Err(KinemaError::Config(_))));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let (mut engine, backend) = engine();
        engine.dispose().unwrap();
        engine.dispose().unwrap();
        assert!(backend.borrow().is_disposed());
        assert!(engine.create_scene("late").is_err());
    }
}
