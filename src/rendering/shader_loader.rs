use std::{
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, channel},
        Arc, RwLock,
    },
    time::Duration,
};

use anyhow::Context;
use id_arena::{Arena, Id};
use naga::{
    back::wgsl::WriterFlags,
    valid::{Capabilities, ValidationFlags},
};
use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor, ShaderLanguage,
};
use notify_debouncer_mini::{
    new_debouncer_opt,
    notify::{RecommendedWatcher, RecursiveMode, Watcher},
    DebounceEventResult, DebouncedEventKind, Debouncer,
};
use pollster::block_on;
use wgpu::{PollType, RenderPipeline};

pub(crate) const SHADER_FOLDER: &str = "assets/shaders";
/// Composable modules, relative to the shader folder.
const SHARED_SHADER_MODULES_FOLDER: &str = "shared";

pub(crate) type PipelineFactory = Box<
    dyn Sync + Send + Fn(&wgpu::Device, &ShaderDefinition, &str) -> anyhow::Result<RenderPipeline>,
>;

#[derive(Debug, Clone)]
pub(crate) struct ShaderDefinition {
    pub name: &'static str,
    pub path: &'static str,
}

pub(crate) struct ShaderEntry {
    pipeline_id: PipelineId,
    def: ShaderDefinition,
    factory: PipelineFactory,
}

pub type PipelineId = Id<PipelineCacheEntry>;

#[derive(Default)]
pub struct PipelineCacheEntry(Option<RenderPipeline>);

impl PipelineCacheEntry {
    pub fn set_pipeline(&mut self, pipeline: RenderPipeline) {
        self.0 = Some(pipeline);
    }
}

pub(crate) struct PipelineCacheBuilder {
    shaders: Arena<ShaderEntry>,
    pipelines: Arena<PipelineCacheEntry>,
}

impl PipelineCacheBuilder {
    pub fn new() -> Self {
        Self {
            shaders: Arena::new(),
            pipelines: Arena::new(),
        }
    }

    pub fn add_shader(
        &mut self,
        shader_def: ShaderDefinition,
        factory: PipelineFactory,
    ) -> PipelineId {
        let pipeline_id = self.pipelines.alloc(PipelineCacheEntry::default());
        self.shaders.alloc(ShaderEntry {
            pipeline_id,
            def: shader_def,
            factory,
        });
        pipeline_id
    }

    pub fn build(self) -> PipelineCache {
        PipelineCache {
            shaders: Arc::new(self.shaders),
            pipelines: self.pipelines,
        }
    }
}

pub(crate) struct PipelineCache {
    shaders: Arc<Arena<ShaderEntry>>,
    pipelines: Arena<PipelineCacheEntry>,
}

impl PipelineCache {
    /// `None` until the pipeline has been compiled once.
    pub fn get(&self, id: PipelineId) -> Option<&RenderPipeline> {
        self.pipelines.get(id).and_then(|entry| entry.0.as_ref())
    }

    fn get_entry_mut(&mut self, id: PipelineId) -> Option<&mut PipelineCacheEntry> {
        self.pipelines.get_mut(id)
    }

    fn iter_shaders_and_pipelines_mut(
        &mut self,
    ) -> impl Iterator<Item = (&ShaderEntry, &mut PipelineCacheEntry)> {
        // Both arenas are filled by add_shader, so their indices line up.
        self.shaders
            .iter()
            .map(|(_, shader_entry)| shader_entry)
            .zip(
                self.pipelines
                    .iter_mut()
                    .map(|(_, pipeline_entry)| pipeline_entry),
            )
    }
}

type CompiledPipeline = (&'static str, PipelineId, RenderPipeline);

/// Compiles shaders into pipelines, and optionally recompiles them on a
/// watcher thread when their files change.
pub(crate) struct ShaderLoader {
    pub cache: PipelineCache,
    device: wgpu::Device,
    shader_folder: PathBuf,
    receiver: Option<mpsc::Receiver<CompiledPipeline>>,
    composer: Arc<RwLock<Composer>>,
    _debouncer: Option<Debouncer<RecommendedWatcher>>,
}

impl ShaderLoader {
    pub fn new(
        device: wgpu::Device,
        cache_builder: PipelineCacheBuilder,
        shader_folder: impl Into<PathBuf>,
        hot_reload: bool,
    ) -> anyhow::Result<Self> {
        let shader_folder = shader_folder.into();
        let cache = cache_builder.build();
        let composer = Arc::new(RwLock::new(create_composer(&shader_folder)?));

        let (receiver, debouncer) = if hot_reload {
            let (receiver, debouncer) = watch_shaders(
                device.clone(),
                &shader_folder,
                cache.shaders.clone(),
                composer.clone(),
            )?;
            (Some(receiver), Some(debouncer))
        } else {
            (None, None)
        };

        let mut shader_loader = Self {
            device,
            shader_folder,
            cache,
            receiver,
            composer,
            _debouncer: debouncer,
        };

        shader_loader.create_all_pipelines()?;

        Ok(shader_loader)
    }

    fn create_all_pipelines(&mut self) -> anyhow::Result<()> {
        let device = &self.device;
        let shader_folder = &self.shader_folder;
        let composer = &self.composer;

        for (shader, pipeline_entry) in self.cache.iter_shaders_and_pipelines_mut() {
            let pipeline = compile_file(device, shader_folder, shader, composer)
                .with_context(|| format!("Failed to compile shader: {}", shader.def.name))?;
            pipeline_entry.set_pipeline(pipeline);
        }

        Ok(())
    }

    /// Swaps in pipelines recompiled since the last call.
    pub fn load_pending_shaders(&mut self) {
        let Some(receiver) = &self.receiver else {
            return;
        };

        while let Ok((name, pipeline_id, pipeline)) = receiver.try_recv() {
            if let Some(entry) = self.cache.get_entry_mut(pipeline_id) {
                log::info!("Shader reloaded: {}", name);
                entry.set_pipeline(pipeline);
            }
        }
    }
}

/// Shaders affected by a change to `changed`. A shared module change affects
/// every shader, since any of them may import it.
fn shaders_to_recompile<'a>(
    changed: &Path,
    shared_folder: &Path,
    shaders: &'a Arena<ShaderEntry>,
) -> Vec<&'a ShaderEntry> {
    let entries = shaders.iter().map(|(_, entry)| entry);

    if changed.starts_with(shared_folder) {
        if changed.extension().map_or(false, |ext| ext == "wgsl") {
            return entries.collect();
        }
        return Vec::new();
    }

    entries
        .filter(|entry| changed.ends_with(entry.def.path))
        .collect()
}

fn reload_shared_modules(
    shader_folder: &Path,
    composer: &RwLock<Composer>,
) -> anyhow::Result<()> {
    let new_composer = create_composer(shader_folder)?;
    let mut composer = composer
        .write()
        .map_err(|_| anyhow::anyhow!("Shader composer lock poisoned"))?;
    *composer = new_composer;
    Ok(())
}

fn watch_shaders(
    device: wgpu::Device,
    shader_folder: &Path,
    shaders: Arc<Arena<ShaderEntry>>,
    composer: Arc<RwLock<Composer>>,
) -> anyhow::Result<(
    mpsc::Receiver<CompiledPipeline>,
    Debouncer<RecommendedWatcher>,
)> {
    let absolute_shader_folder = shader_folder
        .canonicalize()
        .with_context(|| format!("Shader folder {} not found", shader_folder.display()))?;
    let shared_folder = absolute_shader_folder.join(SHARED_SHADER_MODULES_FOLDER);
    let watcher_shader_folder = absolute_shader_folder.clone();

    let (send_new_pipelines, recv_new_pipelines) = channel();

    let mut debouncer = new_debouncer_opt(
        notify_debouncer_mini::Config::default().with_timeout(Duration::from_millis(100)),
        move |res: DebounceEventResult| match res {
            Ok(events) => {
                for event in events {
                    if event.kind != DebouncedEventKind::Any {
                        continue;
                    }

                    let affected = shaders_to_recompile(&event.path, &shared_folder, &shaders);
                    if affected.is_empty() {
                        continue;
                    }

                    if event.path.starts_with(&shared_folder) {
                        log::info!("Shared shader module changed: {}", event.path.display());
                        if let Err(e) = reload_shared_modules(&watcher_shader_folder, &composer) {
                            log::error!("Failed to reload shared shader modules: {:?}", e);
                            continue;
                        }
                    }

                    for entry in affected {
                        match compile_file(&device, &watcher_shader_folder, entry, &composer) {
                            Ok(pipeline) => {
                                if send_new_pipelines
                                    .send((entry.def.name, entry.pipeline_id, pipeline))
                                    .is_err()
                                {
                                    log::debug!("Shader loader dropped, ignoring reload");
                                }
                            }
                            Err(e) => log::error!("Failed to reload shader: {:?}", e),
                        }
                    }
                }
            }
            Err(e) => log::error!("Error debouncing shader changes: {}", e),
        },
    )
    .context("Failed to create shader file watcher")?;

    debouncer
        .watcher()
        .watch(&absolute_shader_folder, RecursiveMode::Recursive)
        .context("Failed to watch shader folder")?;

    log::info!("Watching {} for shader changes", absolute_shader_folder.display());

    Ok((recv_new_pipelines, debouncer))
}

fn compile_file(
    device: &wgpu::Device,
    shader_folder: &Path,
    shader: &ShaderEntry,
    composer: &RwLock<Composer>,
) -> anyhow::Result<RenderPipeline> {
    let shader_def = &shader.def;
    let path = shader_folder.join(shader_def.path);
    let shader_code = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read shader file {}", path.display()))?;

    let file_path = path.to_string_lossy().to_string();

    let module = {
        let mut composer = composer
            .write()
            .map_err(|_| anyhow::anyhow!("Shader composer lock poisoned"))?;

        composer
            .make_naga_module(NagaModuleDescriptor {
                file_path: &file_path,
                source: &shader_code,
                ..Default::default()
            })
            .context("Failed to create Naga module from shader code")?
    };

    // wgpu validates again on pipeline creation; this pass only produces
    // the module info the WGSL writer needs.
    let info = naga::valid::Validator::new(ValidationFlags::empty(), Capabilities::all())
        .validate(&module)
        .context("Failed to validate Naga module")?;

    let shader_code = naga::back::wgsl::write_string(&module, &info, WriterFlags::empty())
        .context("Failed to convert Naga module to WGSL string")?;

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let pipeline = (shader.factory)(device, shader_def, &shader_code);

    device
        .poll(PollType::Wait)
        .context("Failed to poll device after shader compilation")?;

    if let Some(error) = block_on(device.pop_error_scope()) {
        return Err(anyhow::anyhow!(
            "Shader compilation failed for {}: {}",
            shader_def.name,
            error
        ));
    };

    pipeline
}

fn create_composer(shader_folder: &Path) -> anyhow::Result<Composer> {
    let shared_folder = shader_folder.join(SHARED_SHADER_MODULES_FOLDER);
    let shared_files = std::fs::read_dir(&shared_folder).with_context(|| {
        format!(
            "Failed to read shared shader modules directory {}",
            shared_folder.display()
        )
    })?;

    let mut composer = Composer::default();

    for entry in shared_files {
        let path = entry
            .context("Failed to read entry in shared shader modules directory")?
            .path();

        if !path.is_file() || path.extension().map_or(true, |ext| ext != "wgsl") {
            continue;
        }

        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read shared shader module {}", path.display()))?;

        let file_path = path.to_string_lossy().to_string();

        composer
            .add_composable_module(ComposableModuleDescriptor {
                source: &source,
                file_path: &file_path,
                language: ShaderLanguage::Wgsl,
                ..Default::default()
            })
            .with_context(|| format!("Failed to add shared shader module: {}", file_path))?;
    }

    Ok(composer)
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    fn shader_folder() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join(SHADER_FOLDER)
    }

    fn failing_factory() -> PipelineFactory {
        Box::new(|_, def, _| Err(anyhow::anyhow!("{} not compiled in tests", def.name)))
    }

    fn two_shader_builder() -> (PipelineCacheBuilder, PipelineId, PipelineId) {
        let mut builder = PipelineCacheBuilder::new();
        let first = builder.add_shader(
            ShaderDefinition {
                name: "First",
                path: "first.wgsl",
            },
            failing_factory(),
        );
        let second = builder.add_shader(
            ShaderDefinition {
                name: "Second",
                path: "second.wgsl",
            },
            failing_factory(),
        );
        (builder, first, second)
    }

    #[test]
    fn pipelines_are_empty_until_compiled() {
        let (builder, first, second) = two_shader_builder();
        assert_ne!(first, second);

        let mut cache = builder.build();
        assert!(cache.get(first).is_none());

        let names = cache
            .iter_shaders_and_pipelines_mut()
            .map(|(shader, _)| shader.def.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn changed_shader_recompiles_only_itself() {
        let (builder, _, _) = two_shader_builder();
        let cache = builder.build();
        let folder = Path::new("/shaders");
        let shared = folder.join(SHARED_SHADER_MODULES_FOLDER);

        let affected = shaders_to_recompile(&folder.join("second.wgsl"), &shared, &cache.shaders);
        let names = affected.iter().map(|e| e.def.name).collect::<Vec<_>>();
        assert_eq!(names, vec!["Second"]);

        let unrelated = shaders_to_recompile(&folder.join("notes.txt"), &shared, &cache.shaders);
        assert!(unrelated.is_empty());
    }

    #[test]
    fn shared_module_change_recompiles_everything() {
        let (builder, _, _) = two_shader_builder();
        let cache = builder.build();
        let folder = Path::new("/shaders");
        let shared = folder.join(SHARED_SHADER_MODULES_FOLDER);

        let affected = shaders_to_recompile(&shared.join("camera.wgsl"), &shared, &cache.shaders);
        assert_eq!(affected.len(), 2);

        let backup = shaders_to_recompile(&shared.join("camera.wgsl~"), &shared, &cache.shaders);
        assert!(backup.is_empty());
    }

    #[test]
    fn shared_modules_compose() {
        let composer =
            create_composer(&shader_folder()).expect("shared shader modules should load");
        assert!(composer.contains_module("cubefield::camera"));
    }

    #[test]
    fn cube_cloud_shader_composes() {
        let mut composer =
            create_composer(&shader_folder()).expect("shared shader modules should load");
        let path = shader_folder().join("cube_cloud.wgsl");
        let source = std::fs::read_to_string(&path).expect("shader source");

        composer
            .make_naga_module(NagaModuleDescriptor {
                file_path: &path.to_string_lossy(),
                source: &source,
                ..Default::default()
            })
            .expect("cube cloud shader should compose");
    }

    #[test]
    fn composing_ignores_working_directory() {
        Jail::expect_with(|_jail| {
            let composer = create_composer(&shader_folder())
                .map_err(|e| figment::Error::from(format!("{:?}", e)))?;
            assert!(composer.contains_module("cubefield::camera"));
            Ok(())
        });
    }

    #[test]
    fn reloading_shared_modules_replaces_composer() {
        let composer = RwLock::new(Composer::default());
        reload_shared_modules(&shader_folder(), &composer).expect("reload shared modules");

        let composer = composer.read().expect("composer lock");
        assert!(composer.contains_module("cubefield::camera"));
    }
}
