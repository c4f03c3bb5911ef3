use super::*;
use crate::foundation::ids::NodeId;

fn merge(n: u32) -> Node {
    Node {
        id: NodeId::from("m"),
        name: "merge".to_owned(),
        kind: NodeKind::Merge(MergeData { input_count: n }),
    }
}

#[test]
fn ports_follow_input_count() {
    let ports = valid_merge_ports(&MergeData { input_count: 3 });
    let names: Vec<_> = ports.iter().map(PortId::as_str).collect();
    assert_eq!(names, ["input-0", "input-1", "input-2"]);
}

#[test]
fn shrinking_a_merge_invalidates_high_ports() {
    assert!(accepts_input(&merge(3), &merge_port(2)));
    assert!(!accepts_input(&merge(2), &merge_port(2)));
    assert!(!accepts_input(&merge(2), &PortId::from("in")));
}
