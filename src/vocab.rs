//! Vocabulary IRIs used by the resolver and the traversal queries.

pub const MU_CORE_UUID: &str = "http://mu.semte.ch/vocabularies/core/uuid";

pub const MU_HIERARCHY_HIERARCHY: &str = "http://mu.semte.ch/vocabularies/hierarchy/Hierarchy";
pub const MU_HIERARCHY_PATH: &str = "http://mu.semte.ch/vocabularies/hierarchy/path";
pub const MU_HIERARCHY_RESTRICTION: &str = "http://mu.semte.ch/vocabularies/hierarchy/restriction";
pub const MU_HIERARCHY_CODED_PROPERTY: &str =
    "http://mu.semte.ch/vocabularies/hierarchy/codedProperty";
pub const MU_HIERARCHY_FILTER_CLASS: &str = "http://mu.semte.ch/vocabularies/hierarchy/Filter";
pub const MU_HIERARCHY_FILTER: &str = "http://mu.semte.ch/vocabularies/hierarchy/filter";
pub const MU_HIERARCHY_DEPTH: &str = "http://mu.semte.ch/vocabularies/hierarchy/depth";

pub const SKOS_BROADER: &str = "http://www.w3.org/2004/02/skos/core#broader";
pub const SKOS_IN_SCHEME: &str = "http://www.w3.org/2004/02/skos/core#inScheme";
pub const SKOS_PREF_LABEL: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";

pub const ESCO_STRUCTURE: &str = "http://data.europa.eu/esco/model#Structure";
pub const ESCO_CODED_PROPERTY: &str = "http://data.europa.eu/esco/model#codedProperty";
pub const ESCO_STRUCTURE_FOR: &str = "http://data.europa.eu/esco/model#structureFor";
pub const ESCO_CODE_LIST: &str = "http://data.europa.eu/esco/model#codeList";
pub const ESCO_MEMBER_CONCEPT: &str = "http://data.europa.eu/esco/model#MemberConcept";

pub const ETMS_FETCH_CHILDREN: &str = "http://sem.tenforce.com/vocabularies/etms/fetchChildren";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
