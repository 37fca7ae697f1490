//! services/site/src/adapters/views.rs
//!
//! This module contains the file-based view renderer. It implements the
//! `ViewRenderer` port from the `core` crate with Handlebars templates:
//!
//! - `<root>/<view>.html` is the page, `<root>/layouts/main.html` wraps it.
//! - Every `<root>/partials/<name>.html` is available as `{{> name}}`.
//! - `{{#section "name"}} .. {{/section}}` renders into a named section instead
//!   of the page body. The layout receives sections as `_sections.<name>` and
//!   the page body as `body`.

use async_trait::async_trait;
use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderErrorReason,
    Renderable,
};
use meadowlark_core::ports::{PortError, PortResult, ViewRenderer};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, LazyLock, Mutex};

// `{{> name}}`, `{{~> name}}` and block partials `{{#> name}}`.
static PARTIAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{~?#?>\s*([\w./-]+)").expect("partial pattern is valid")
});

const VIEW: &str = "view";
const LAYOUT: &str = "layout";

//=========================================================================================
// Sections
//=========================================================================================

type Sections = Arc<Mutex<BTreeMap<String, String>>>;

/// The `section` block helper: renders its block into a named section and
/// writes nothing in place.
#[derive(Clone, Default)]
struct SectionHelper {
    sections: Sections,
}

impl HelperDef for SectionHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        _out: &mut dyn Output,
    ) -> HelperResult {
        let name = h
            .param(0)
            .and_then(|p| p.value().as_str())
            .ok_or(RenderErrorReason::ParamNotFoundForIndex("section", 0))?
            .to_string();
        let content = match h.template() {
            Some(template) => template.renders(r, ctx, rc)?,
            None => String::new(),
        };
        let mut sections = self
            .sections
            .lock()
            .map_err(|_| RenderErrorReason::Other("section store poisoned".to_string()))?;
        sections.entry(name).or_default().push_str(&content);
        Ok(())
    }
}

//=========================================================================================
// Partials
//=========================================================================================

fn referenced_partials(source: &str) -> impl Iterator<Item = &str> {
    PARTIAL_REGEX
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Finds a chain of partials that includes itself, starting from the
/// partials `roots` refer to. Returns the chain, first name repeated last.
fn partial_cycle<'a>(roots: &[&'a str], partials: &'a BTreeMap<String, String>) -> Option<Vec<&'a str>> {
    fn visit<'a>(
        name: &'a str,
        partials: &'a BTreeMap<String, String>,
        trail: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
    ) -> Option<Vec<&'a str>> {
        if let Some(start) = trail.iter().position(|n| *n == name) {
            let mut cycle = trail[start..].to_vec();
            cycle.push(name);
            return Some(cycle);
        }
        if done.contains(name) {
            return None;
        }
        let source = partials.get(name)?;
        trail.push(name);
        for next in referenced_partials(source) {
            if let Some(cycle) = visit(next, partials, trail, done) {
                return Some(cycle);
            }
        }
        trail.pop();
        done.insert(name);
        None
    }

    let mut done = HashSet::new();
    roots
        .iter()
        .flat_map(|root| referenced_partials(*root))
        .find_map(|name| visit(name, partials, &mut Vec::new(), &mut done))
}

//=========================================================================================
// Rendering
//=========================================================================================

/// The template sources needed for one page.
#[derive(Debug, Default)]
struct Sources {
    view: String,
    layout: Option<String>,
    partials: BTreeMap<String, String>,
}

fn template_error(e: impl std::fmt::Display) -> PortError {
    PortError::Unexpected(format!("template: {}", e))
}

fn render_page(sources: &Sources, data: &Value) -> PortResult<String> {
    let mut roots = vec![sources.view.as_str()];
    roots.extend(sources.layout.as_deref());
    if let Some(cycle) = partial_cycle(&roots, &sources.partials) {
        return Err(PortError::Unexpected(format!("partials include themselves: {}", cycle.join(" > "))));
    }

    let helper = SectionHelper::default();
    let sections = Arc::clone(&helper.sections);

    let mut registry = Handlebars::new();
    registry.register_helper("section", Box::new(helper));
    for (name, source) in &sources.partials {
        registry.register_partial(name, source).map_err(template_error)?;
    }

    // 1. Render the view itself, collecting named sections.
    registry.register_template_string(VIEW, &sources.view).map_err(template_error)?;
    let body = registry.render(VIEW, data).map_err(template_error)?;

    let Some(layout) = &sources.layout else {
        return Ok(body);
    };

    // 2. Hand the body and sections to the layout as explicit values.
    let collected = sections
        .lock()
        .map_err(|_| PortError::Unexpected("section store poisoned".to_string()))?
        .clone();
    let mut context = match data {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    context.insert("body".to_string(), Value::String(body));
    context.insert(
        "_sections".to_string(),
        Value::Object(collected.into_iter().map(|(k, v)| (k, Value::String(v))).collect()),
    );

    registry.register_template_string(LAYOUT, layout).map_err(template_error)?;
    registry.render(LAYOUT, &Value::Object(context)).map_err(template_error)
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Renders `<root>/<view>.html` inside `<root>/layouts/<layout>.html`.
#[derive(Clone, Debug)]
pub struct TemplateRenderer {
    root: PathBuf,
    layout: Option<String>,
}

impl TemplateRenderer {
    /// Creates a renderer using the `main` layout.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            layout: Some("main".to_string()),
        }
    }

    /// Renders views without wrapping them in a layout.
    pub fn without_layout(mut self) -> Self {
        self.layout = None;
        self
    }

    async fn read(&self, name: &str) -> PortResult<String> {
        if name.is_empty() || name.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
            return Err(PortError::NotFound(format!("view '{}'", name)));
        }
        let path = self.root.join(format!("{}.html", name));
        tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PortError::NotFound(format!("view '{}'", name)),
            _ => PortError::Unexpected(format!("{}: {}", path.display(), e)),
        })
    }

    /// Reads every `partials/*.html`. A missing directory means no partials.
    async fn read_partials(&self) -> PortResult<BTreeMap<String, String>> {
        let dir = self.root.join("partials");
        let mut partials = BTreeMap::new();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(partials),
            Err(e) => return Err(PortError::Unexpected(format!("{}: {}", dir.display(), e))),
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PortError::Unexpected(format!("{}: {}", dir.display(), e)))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("html") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let source = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| PortError::Unexpected(format!("{}: {}", path.display(), e)))?;
            partials.insert(name.to_string(), source);
        }
        Ok(partials)
    }
}

#[async_trait]
impl ViewRenderer for TemplateRenderer {
    async fn render(&self, view: &str, data: &Value) -> PortResult<String> {
        let view = self.read(view).await?;
        let layout = match &self.layout {
            Some(layout) => Some(self.read(&format!("layouts/{}", layout)).await?),
            None => None,
        };
        let partials = self.read_partials().await?;
        render_page(&Sources { view, layout, partials }, data)
    }
}
