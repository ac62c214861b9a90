//! Filter template tokenizing and rendering.
//!
//! Placeholders are written `#{NAME}`. Two names are macros:
//! `#{DESCENDANT_TO_NODE}` connects `?descendant` to `?node` along the
//! hierarchy, and `#{PATH}` is the traversal path of the current query. Every
//! other name is a request parameter, bound from `filter-NAME`.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::hierarchy::{connect, HierarchyDefinition};
use crate::sparql::{Pattern, PropertyPath, Term};
use crate::vocab;

pub const DESCENDANT_TO_NODE: &str = "DESCENDANT_TO_NODE";
pub const PATH: &str = "PATH";

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\{([^{}]*)\}").expect("Invalid placeholder pattern"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    DescendantToNode,
    Path,
    Param(String),
}

/// How far the descendant macro reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroDepth {
    /// Exactly this many hops; 0 is the node itself.
    Level(usize),
    /// Any depth from 1 to the bound, or the node itself.
    UpTo(usize),
}

/// A parsed filter template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl FilterTemplate {
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut last = 0;
        for caps in placeholder_regex().captures_iter(source) {
            let Some(whole) = caps.get(0) else { continue };
            if whole.start() > last {
                segments.push(Segment::Text(source[last..whole.start()].to_string()));
            }
            let segment = match &caps[1] {
                DESCENDANT_TO_NODE => Segment::DescendantToNode,
                PATH => Segment::Path,
                name => Segment::Param(name.to_string()),
            };
            segments.push(segment);
            last = whole.end();
        }
        if last < source.len() {
            segments.push(Segment::Text(source[last..].to_string()));
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    /// Expand macros, then substitute parameters. Parameters with no value
    /// keep their placeholder text.
    pub fn render(
        &self,
        hierarchy: &HierarchyDefinition,
        traversal_path: &PropertyPath,
        params: &BTreeMap<String, String>,
        depth: MacroDepth,
    ) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::DescendantToNode => {
                    out.push_str(&descendant_to_node(hierarchy, depth).to_string());
                }
                Segment::Path => out.push_str(&traversal_path.to_string()),
                Segment::Param(name) => match params.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("#{");
                        out.push_str(name);
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}

/// The pattern the descendant macro stands for.
pub fn descendant_to_node(hierarchy: &HierarchyDefinition, depth: MacroDepth) -> Pattern {
    let descendant = Term::var("descendant");
    let node = Term::var("node");
    match depth {
        MacroDepth::Level(0) => Pattern::Group(self_match()),
        MacroDepth::Level(level) => connect(&descendant, &node, hierarchy, level),
        MacroDepth::UpTo(max_depth) => {
            let mut branches: Vec<Vec<Pattern>> = (1..=max_depth.max(1))
                .map(|level| vec![connect(&descendant, &node, hierarchy, level)])
                .collect();
            branches.push(self_match());
            Pattern::union(branches)
        }
    }
}

/// `?descendant` is `?node`. Expressed as a typed triple plus equality filter
/// rather than a BIND, which not every store accepts here.
fn self_match() -> Vec<Pattern> {
    vec![
        Pattern::triple(
            Term::var("descendant"),
            PropertyPath::iri(vocab::RDF_TYPE),
            Term::var("thing"),
        ),
        Pattern::Filter("?descendant = ?node".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const BROADER: &str = "http://www.w3.org/2004/02/skos/core#broader";

    fn hierarchy() -> HierarchyDefinition {
        HierarchyDefinition {
            name: "test".to_string(),
            id: "h1".to_string(),
            primary_path: PropertyPath::iri(BROADER),
            extension_path: None,
            restriction: Vec::new(),
        }
    }

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn broader() -> PropertyPath {
        PropertyPath::iri(BROADER)
    }

    #[test]
    fn test_parse_segments() {
        let t = FilterTemplate::parse("?node <x> #{status} . #{DESCENDANT_TO_NODE} #{PATH}");
        assert_eq!(
            t.segments,
            vec![
                Segment::Text("?node <x> ".to_string()),
                Segment::Param("status".to_string()),
                Segment::Text(" . ".to_string()),
                Segment::DescendantToNode,
                Segment::Text(" ".to_string()),
                Segment::Path,
            ]
        );
    }

    #[test]
    fn test_plain_template_untouched() {
        let text = "?node <http://x/status> \"published\" .";
        let t = FilterTemplate::parse(text);
        assert_eq!(t.segments, vec![Segment::Text(text.to_string())]);
        let out = t.render(&hierarchy(), &broader(), &params(&[]), MacroDepth::Level(1));
        assert_eq!(out, text);
    }

    #[test]
    fn test_param_substitution() {
        let t = FilterTemplate::parse("?node <http://x/status> \"#{status}\" . #{lang}");
        let out = t.render(
            &hierarchy(),
            &broader(),
            &params(&[("status", "published"), ("unused", "x")]),
            MacroDepth::Level(1),
        );
        assert_eq!(out, "?node <http://x/status> \"published\" . #{lang}");
    }

    #[test]
    fn test_param_value_is_not_rescanned() {
        let t = FilterTemplate::parse("#{a} #{b}");
        let out = t.render(
            &hierarchy(),
            &broader(),
            &params(&[("a", "#{b}"), ("b", "B")]),
            MacroDepth::Level(1),
        );
        assert_eq!(out, "#{b} B");
    }

    #[test]
    fn test_macro_at_level_is_single_pattern() {
        let t = FilterTemplate::parse("#{DESCENDANT_TO_NODE}");
        let out = t.render(&hierarchy(), &broader(), &params(&[]), MacroDepth::Level(2));
        assert_eq!(out, format!("?descendant <{b}> / <{b}> ?node .", b = BROADER));
        assert!(!out.contains("UNION"));
    }

    #[test]
    fn test_macro_at_level_zero_is_self_match() {
        let t = FilterTemplate::parse("#{DESCENDANT_TO_NODE}");
        let out = t.render(&hierarchy(), &broader(), &params(&[]), MacroDepth::Level(0));
        assert!(out.contains("FILTER(?descendant = ?node)"));
        assert!(!out.contains(BROADER));
    }

    #[test]
    fn test_macro_up_to_bound() {
        let t = FilterTemplate::parse("#{DESCENDANT_TO_NODE}");
        let out = t.render(&hierarchy(), &broader(), &params(&[]), MacroDepth::UpTo(3));
        // three connection depths plus the self match
        assert_eq!(out.matches("UNION").count(), 3);
        assert!(out.contains(&format!("?descendant <{b}> ?node .", b = BROADER)));
        assert!(out.contains(&format!("?descendant <{b}> / <{b}> / <{b}> ?node .", b = BROADER)));
        assert!(!out.contains(&format!("<{b}> / <{b}> / <{b}> / <{b}>", b = BROADER)));
        assert!(out.contains("FILTER(?descendant = ?node)"));
    }

    #[test]
    fn test_path_macro() {
        let t = FilterTemplate::parse("?x #{PATH} ?node .");
        let out = t.render(&hierarchy(), &broader().repeat(2), &params(&[]), MacroDepth::Level(0));
        assert_eq!(out, format!("?x <{b}> / <{b}> ?node .", b = BROADER));
    }
}
