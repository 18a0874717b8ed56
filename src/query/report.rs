use serde::Serialize;

/// Degree and contact chain size per root, aligned to the root columns.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSummary {
    /// Ingoing degree inside the ingoing window.
    pub in_degree: Vec<u32>,
    /// Outgoing degree inside the outgoing window.
    pub out_degree: Vec<u32>,
    /// Nodes reachable by ingoing time-respecting paths, root excluded.
    pub ingoing_contact_chain: Vec<u32>,
    /// Nodes reachable by outgoing time-respecting paths, root excluded.
    pub outgoing_contact_chain: Vec<u32>,
}

/// One row per reached node per root, per direction.
///
/// Within one root, rows are ordered by reached node id.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortestPaths {
    /// Minimum ingoing distance.
    pub in_distance: Vec<u32>,
    /// One-based row of the contact that first achieved `in_distance`.
    pub in_rowid: Vec<u32>,
    /// One-based position of the originating root.
    pub in_index: Vec<u32>,
    /// One-based id of the reached node.
    pub in_node: Vec<u32>,
    /// Minimum outgoing distance.
    pub out_distance: Vec<u32>,
    /// One-based row of the contact that first achieved `out_distance`.
    pub out_rowid: Vec<u32>,
    /// One-based position of the originating root.
    pub out_index: Vec<u32>,
    /// One-based id of the reached node.
    pub out_node: Vec<u32>,
}

/// Contacts traced from one root.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootTrace {
    /// One-based rows of ingoing contacts.
    pub in_rowid: Vec<u32>,
    /// Distance of each ingoing contact.
    pub in_distance: Vec<u32>,
    /// One-based rows of outgoing contacts.
    pub out_rowid: Vec<u32>,
    /// Distance of each outgoing contact.
    pub out_distance: Vec<u32>,
}

/// Traced contacts for every root, in root order.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ContactTrace {
    /// One entry per root.
    pub groups: Vec<RootTrace>,
}

impl ContactTrace {
    /// The `4 * roots` sequence view: in-rowid, in-distance, out-rowid, out-distance per root.
    pub fn flatten(&self) -> Vec<&[u32]> {
        self.groups
            .iter()
            .flat_map(|g| {
                [
                    g.in_rowid.as_slice(),
                    g.in_distance.as_slice(),
                    g.out_rowid.as_slice(),
                    g.out_distance.as_slice(),
                ]
            })
            .collect()
    }
}
