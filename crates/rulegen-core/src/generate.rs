//! Rule generation for one directory.
//!
//! [`generate_rules`] runs the whole pass for a directory: eligibility,
//! classification and walking, then library, binary, fixture and test
//! emission in that order, and finally the collision flush. A pass either
//! returns every declaration or none of them.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::classify::{
    classify_files, has_entrypoint_file, Classification, BINARY_ENTRYPOINT_FILENAME,
    FIXTURE_FILENAME, FIXTURE_TARGET_NAME, LIBRARY_ENTRYPOINT_FILENAME, TEST_ENTRYPOINT_FILENAME,
    TEST_ENTRYPOINT_TARGET_NAME,
};
use crate::collision::{CollisionDetector, CollisionError};
use crate::config::{
    GenerationMode, PythonConfig, BINARY_NAMING_CONVENTION, LIBRARY_NAMING_CONVENTION,
    TEST_NAMING_CONVENTION,
};
use crate::existing::ExistingFile;
use crate::resolver::{DependencyResolver, PackageContext, ResolveError};
use crate::target::TargetBuilder;
use crate::types::{GenerateResult, Module, RuleKind};
use crate::utils::paths::{join_rel, stem};
use crate::utils::ExcludeSet;
use crate::walker::{compile_excludes, is_package, SubdirWalker, WalkError};

/// Inputs of one generation pass.
#[derive(Debug, Clone, Copy)]
pub struct GenerateArgs<'a> {
    /// Repository root on disk.
    pub repo_root: &'a Path,
    /// Absolute directory being generated.
    pub dir: &'a Path,
    /// Repository-relative path of `dir` (`""` for the root).
    pub rel: &'a str,
    /// Effective configuration of `dir`.
    pub config: &'a PythonConfig,
    /// Effective configuration of the parent directory.
    pub parent: Option<&'a PythonConfig>,
    /// Regular file names directly inside `dir`.
    pub regular_files: &'a [String],
    /// Immediate subdirectory names of `dir`.
    pub subdirs: &'a [String],
    /// The build file already present in `dir`, if any.
    pub existing: Option<&'a ExistingFile>,
    /// Absolute paths left after the caller's ignore rules; entries
    /// outside it are never walked. `None` admits everything.
    pub visible: Option<&'a BTreeSet<PathBuf>>,
}

/// Why a pass produced no declarations.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Walking the directory failed; only this directory is affected.
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// The resolver failed; the whole run must stop.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Generated names collide with existing declarations.
    #[error("{} naming collision(s)", .0.len())]
    Collisions(Vec<CollisionError>),
}

/// Generates the declarations of one directory.
///
/// # Errors
///
/// See [`GenerateError`]. Collisions are reported together, after every
/// target of the pass has been considered.
pub fn generate_rules(
    args: &GenerateArgs<'_>,
    resolver: &dyn DependencyResolver,
) -> Result<GenerateResult, GenerateError> {
    let cfg = args.config;

    if !is_eligible(args) {
        debug!("Skipping //{}: not eligible", args.rel);
        return Ok(GenerateResult::new());
    }

    let excludes = compile_excludes(cfg)?;
    let mut sources = classify_local(args, &excludes);

    let has_test_target = !sources.has_test_entry
        && args
            .existing
            .is_some_and(|file| file.has_rule(TEST_ENTRYPOINT_TARGET_NAME));

    let mut walker =
        SubdirWalker::new(args.dir, args.rel, cfg, &excludes).restrict_to(args.visible);
    for subdir in args.subdirs {
        let repo_path = join_rel(args.rel, subdir);
        if excludes.matches(&repo_path) {
            debug!("Skipping excluded subdirectory {repo_path}");
            continue;
        }
        walker.walk(subdir, &mut sources)?;
    }

    let mut pass = Pass::new(args, resolver, sources.all_sources.clone());
    pass.emit_libraries(&sources)?;
    if sources.has_binary_entry {
        pass.emit_entry_binary()?;
    }
    let has_fixture = if sources.has_fixture {
        pass.emit_fixture()?;
        true
    } else {
        false
    };
    pass.emit_tests(&sources, has_test_target, has_fixture)?;

    pass.finish()
}

fn is_eligible(args: &GenerateArgs<'_>) -> bool {
    let cfg = args.config;
    if !cfg.extension_enabled() {
        return false;
    }
    if is_package(args.dir, cfg.build_file_names()) {
        return true;
    }
    if cfg.coarse_grained_generation() {
        !args.parent.is_some_and(PythonConfig::coarse_grained_generation)
    } else {
        has_entrypoint_file(args.dir)
    }
}

fn classify_local(args: &GenerateArgs<'_>, excludes: &ExcludeSet) -> Classification {
    let cfg = args.config;
    let files = args
        .regular_files
        .iter()
        .filter(|file| !excludes.matches(&join_rel(args.rel, file)));
    classify_files(files, |name| cfg.ignores_file(name))
}

fn package_name(args: &GenerateArgs<'_>) -> String {
    args.dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// State of one pass: the growing result and the pass-wide collisions.
struct Pass<'a> {
    args: &'a GenerateArgs<'a>,
    resolver: &'a dyn DependencyResolver,
    detector: CollisionDetector<'a>,
    package_name: String,
    visibility: Vec<String>,
    siblings: BTreeSet<String>,
    result: GenerateResult,
}

impl<'a> Pass<'a> {
    /// `siblings` are the package directory's own sources, after ignores
    /// and excludes.
    fn new(
        args: &'a GenerateArgs<'a>,
        resolver: &'a dyn DependencyResolver,
        siblings: BTreeSet<String>,
    ) -> Self {
        let cfg = args.config;
        let mut visibility = vec![format!("//{}:__subpackages__", cfg.project_root())];
        visibility.extend(cfg.visibility().iter().cloned());

        Self {
            args,
            resolver,
            detector: CollisionDetector::new(args.rel, args.existing),
            package_name: package_name(args),
            visibility,
            siblings,
            result: GenerateResult::new(),
        }
    }

    fn ctx(&self) -> PackageContext<'a> {
        PackageContext {
            repo_root: self.args.repo_root,
            rel: self.args.rel,
            config: self.args.config,
        }
    }

    fn actual_kind(&self, kind: RuleKind) -> &'a str {
        self.args.config.actual_kind_name(kind)
    }

    fn draft(&self, kind: RuleKind, name: &str) -> TargetBuilder {
        TargetBuilder::new(
            kind,
            name,
            self.args.config.project_root(),
            self.args.rel,
            &self.siblings,
        )
    }

    fn visible_draft(&self, kind: RuleKind, name: &str) -> TargetBuilder {
        self.visibility
            .iter()
            .fold(self.draft(kind, name), |draft, label| {
                draft.add_visibility(label.as_str())
            })
    }

    fn emit_libraries(&mut self, sources: &Classification) -> Result<(), GenerateError> {
        let cfg = self.args.config;

        if cfg.per_file_generation() {
            for file in &sources.library_sources {
                if file == LIBRARY_ENTRYPOINT_FILENAME && self.is_placeholder(file)? {
                    warn!("Skipping empty {}", join_rel(self.args.rel, file));
                    continue;
                }
                let srcs = BTreeSet::from([file.clone()]);
                self.emit_library(srcs, stem(file), sources.has_binary_entry)?;
            }
        } else if !sources.library_sources.is_empty() {
            let name = cfg.render_library_name(&self.package_name);
            self.emit_library(
                sources.library_sources.clone(),
                &name,
                sources.has_binary_entry,
            )?;
        }
        Ok(())
    }

    fn is_placeholder(&self, file: &str) -> Result<bool, GenerateError> {
        let path = self.args.dir.join(file);
        let meta = fs::metadata(&path).map_err(|source| WalkError::Stat { path, source })?;
        Ok(meta.len() == 0)
    }

    /// Emits one library and, without a `__main__.py`, a binary per main module.
    fn emit_library(
        &mut self,
        mut srcs: BTreeSet<String>,
        name: &str,
        has_binary_entry: bool,
    ) -> Result<(), GenerateError> {
        let resolution = self.resolver.resolve(&self.ctx(), &srcs)?;
        let library_kind = self.actual_kind(RuleKind::Library);
        self.detector
            .check(name, library_kind, Some(LIBRARY_NAMING_CONVENTION));

        let mut binaries = Vec::new();
        if !has_binary_entry {
            let mut main_modules = resolution.main_modules.clone();
            main_modules.sort();
            let binary_kind = self.actual_kind(RuleKind::Binary);

            for file in main_modules {
                let binary_name = stem(&file);
                if let Some(existing) = self.detector.conflicts(binary_name, binary_kind).next() {
                    warn!(
                        "failed to generate target \"//{}:{binary_name}\" of kind \"{binary_kind}\": \
                         a target of kind \"{}\" with the same name already exists",
                        self.args.rel, existing.kind
                    );
                    continue;
                }
                srcs.remove(&file);
                binaries.push(
                    self.visible_draft(RuleKind::Binary, binary_name)
                        .add_src(file.as_str())
                        .add_module_dependencies(resolution.modules.iter().cloned())
                        .generate_imports_attribute()
                        .build(),
                );
            }
        }

        if srcs.is_empty() {
            debug!("Library {name} has no sources left after main modules");
        } else {
            let library = self
                .visible_draft(RuleKind::Library, name)
                .add_srcs(srcs)
                .add_module_dependencies(resolution.modules)
                .generate_imports_attribute()
                .build();
            self.result.push(library);
        }
        for binary in binaries {
            self.result.push(binary);
        }
        Ok(())
    }

    fn emit_entry_binary(&mut self) -> Result<(), GenerateError> {
        let resolution = self
            .resolver
            .resolve_single(&self.ctx(), BINARY_ENTRYPOINT_FILENAME)?;
        let name = self
            .args
            .config
            .render_binary_name(&self.package_name);
        let kind = self.actual_kind(RuleKind::Binary);
        self.detector
            .check(&name, kind, Some(BINARY_NAMING_CONVENTION));

        let binary = self
            .visible_draft(RuleKind::Binary, &name)
            .set_main(BINARY_ENTRYPOINT_FILENAME)
            .add_src(BINARY_ENTRYPOINT_FILENAME)
            .add_module_dependencies(resolution.modules)
            .generate_imports_attribute()
            .build();
        self.result.push(binary);
        Ok(())
    }

    fn emit_fixture(&mut self) -> Result<(), GenerateError> {
        let resolution = self
            .resolver
            .resolve_single(&self.ctx(), FIXTURE_FILENAME)?;
        let kind = self.actual_kind(RuleKind::Library);
        self.detector.check(FIXTURE_TARGET_NAME, kind, None);

        let fixture = self
            .visible_draft(RuleKind::Library, FIXTURE_TARGET_NAME)
            .add_src(FIXTURE_FILENAME)
            .add_module_dependencies(resolution.modules)
            .set_testonly()
            .generate_imports_attribute()
            .build();
        self.result.push(fixture);
        Ok(())
    }

    fn test_draft(&mut self, srcs: &BTreeSet<String>, name: &str) -> Result<TargetBuilder, GenerateError> {
        let resolution = self.resolver.resolve(&self.ctx(), srcs)?;
        let kind = self.actual_kind(RuleKind::Test);
        self.detector
            .check(name, kind, Some(TEST_NAMING_CONVENTION));

        Ok(self
            .draft(RuleKind::Test, name)
            .add_srcs(srcs.iter().cloned())
            .add_module_dependencies(resolution.modules)
            .generate_imports_attribute())
    }

    fn emit_tests(
        &mut self,
        sources: &Classification,
        has_test_target: bool,
        has_fixture: bool,
    ) -> Result<(), GenerateError> {
        let cfg = self.args.config;
        let entry_target = format!(":{TEST_ENTRYPOINT_TARGET_NAME}");
        let entry_main = format!(":{TEST_ENTRYPOINT_FILENAME}");

        let aggregate = !cfg.per_file_generation()
            && (sources.has_test_entry
                || has_test_target
                || cfg.coarse_grained_generation()
                || (cfg.generation_mode() == GenerationMode::Package
                    && !cfg.per_package_require_test_entry_point()));

        let mut drafts = Vec::new();
        if aggregate {
            let mut srcs = sources.test_sources.clone();
            if sources.has_test_entry {
                srcs.insert(TEST_ENTRYPOINT_FILENAME.to_string());
            }
            if has_test_target || !srcs.is_empty() {
                let name = cfg.render_test_name(&self.package_name);
                let mut draft = self.test_draft(&srcs, &name)?;
                if has_test_target {
                    draft = draft
                        .add_src(entry_target.as_str())
                        .add_resolved_dependency(entry_target.as_str())
                        .set_main(entry_main.as_str());
                } else if sources.has_test_entry {
                    draft = draft.set_main(TEST_ENTRYPOINT_FILENAME);
                }
                drafts.push(draft);
            }
        } else {
            for file in &sources.test_sources {
                let srcs = BTreeSet::from([file.clone()]);
                let mut draft = self.test_draft(&srcs, stem(file))?;
                if has_test_target {
                    draft = draft
                        .add_src(entry_target.as_str())
                        .add_resolved_dependency(entry_target.as_str())
                        .set_main(entry_main.as_str());
                } else if sources.has_test_entry {
                    draft = draft
                        .add_src(TEST_ENTRYPOINT_FILENAME)
                        .set_main(TEST_ENTRYPOINT_FILENAME);
                }
                drafts.push(draft);
            }
        }

        for draft in drafts {
            let draft = if has_fixture {
                draft.add_module_dependency(Module::new(FIXTURE_TARGET_NAME))
            } else {
                draft
            };
            self.result.push(draft.build());
        }
        Ok(())
    }

    fn finish(self) -> Result<GenerateResult, GenerateError> {
        for name in self.result.duplicate_names() {
            warn!(
                "Target name {name} is generated more than once in //{}",
                self.args.rel
            );
        }
        if self.detector.is_empty() {
            debug!(
                "Generated {} declaration(s) for //{}",
                self.result.len(),
                self.args.rel
            );
            Ok(self.result)
        } else {
            Err(GenerateError::Collisions(self.detector.flush()))
        }
    }
}
