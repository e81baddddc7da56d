use crate::campaign::Campaign;
use crate::dict::SchemaDict;
use crate::error::Result;

pub const NODE_SET_ALL: &str = "NodeSetAll";
pub const NODE_SET_NODE_LIST: &str = "NodeSetNodeList";

/// Nodeset covering `node_ids`, or every node when the list is empty.
pub fn node_set(campaign: &Campaign, node_ids: &[u32]) -> Result<SchemaDict> {
    let schema = campaign.schema()?;
    if node_ids.is_empty() {
        return SchemaDict::for_class(&schema, NODE_SET_ALL);
    }
    let mut nodeset = SchemaDict::for_class(&schema, NODE_SET_NODE_LIST)?;
    nodeset.set("Node_List", node_ids.to_vec())?;
    Ok(nodeset)
}

#[cfg(test)]
mod tests {
    use super::node_set;
    use crate::interventions::test_campaign;
    use serde_json::json;

    #[test]
    fn empty_list_targets_all_nodes() {
        let (_dir, campaign) = test_campaign();
        let nodeset = node_set(&campaign, &[]).expect("nodeset");
        assert_eq!(nodeset, json!({"class": "NodeSetAll"}));
    }

    #[test]
    fn explicit_ids_build_a_node_list() {
        let (_dir, campaign) = test_campaign();
        let nodeset = node_set(&campaign, &[1, 2]).expect("nodeset");
        assert_eq!(nodeset, json!({"Node_List": [1, 2], "class": "NodeSetNodeList"}));
    }

    #[test]
    fn requires_a_schema() {
        let campaign = crate::campaign::Campaign::new();
        assert!(node_set(&campaign, &[]).is_err());
    }
}
