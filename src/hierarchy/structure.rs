//! Hierarchies derived from structure descriptions.
//!
//! A structure ties a code list to the scheme it classifies through a coded
//! property. The derived hierarchy walks `skos:broader` and accepts the coded
//! property on the last hop.

use super::HierarchyDefinition;
use crate::sparql::{Pattern, PropertyPath, Term};
use crate::store::Row;
use crate::vocab;

/// A stored structure, as read from the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureDefinition {
    pub id: String,
    pub name: String,
    pub coded_property: String,
    /// Scheme whose member concepts the structure classifies.
    pub structure_for: String,
    /// Scheme of the code list itself.
    pub code_list: String,
    /// When false, children outside the code list are not followed.
    pub fetch_children: bool,
}

impl StructureDefinition {
    /// Build from a lookup row. Returns `None` when a required binding is
    /// missing.
    pub fn from_row(id: &str, row: &Row) -> Option<Self> {
        Some(Self {
            id: id.to_string(),
            name: row.get("name").unwrap_or_default().to_string(),
            coded_property: row.get("codedProperty")?.to_string(),
            structure_for: row.get("structureFor")?.to_string(),
            code_list: row.get("codeList")?.to_string(),
            fetch_children: row
                .get("fetchChildren")
                .map(|v| !v.trim().eq_ignore_ascii_case("false"))
                .unwrap_or(true),
        })
    }

    /// Derive the hierarchy for this structure.
    ///
    /// The target must sit in the code list or in the classified scheme. A
    /// node qualifies when it is in the code list, or when it is a member
    /// concept of the classified scheme. For descendant queries a structure
    /// that does not fetch children additionally requires such members to be
    /// in the code list.
    pub fn to_hierarchy(&self, for_ancestors: bool) -> HierarchyDefinition {
        let node = Term::var("node");
        let scheme = Term::var("scheme");
        let in_scheme = PropertyPath::iri(vocab::SKOS_IN_SCHEME);

        let mut member_branch = vec![
            Pattern::triple(node.clone(), in_scheme.clone(), Term::iri(&self.structure_for)),
            Pattern::triple(
                node.clone(),
                PropertyPath::iri(vocab::RDF_TYPE),
                Term::iri(vocab::ESCO_MEMBER_CONCEPT),
            ),
        ];
        if !self.fetch_children && !for_ancestors {
            member_branch.push(Pattern::triple(
                node.clone(),
                in_scheme.clone(),
                Term::iri(&self.code_list),
            ));
        }

        let restriction = vec![
            Pattern::triple(Term::var("target"), in_scheme.clone(), scheme),
            Pattern::Filter(format!(
                "?scheme IN ({}, {})",
                Term::iri(&self.code_list),
                Term::iri(&self.structure_for)
            )),
            Pattern::union(vec![
                vec![Pattern::triple(node, in_scheme, Term::iri(&self.code_list))],
                member_branch,
            ]),
        ];

        HierarchyDefinition {
            name: self.name.clone(),
            id: self.id.clone(),
            primary_path: PropertyPath::iri(vocab::SKOS_BROADER),
            extension_path: Some(PropertyPath::iri(&self.coded_property)),
            restriction,
        }
    }
}
