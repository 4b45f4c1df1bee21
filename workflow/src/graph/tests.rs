use glam::Vec2;
use proptest::prelude::*;

use super::*;
use crate::block::Position;
use crate::constants::{BLOCK_HEIGHT, BLOCK_WIDTH, CANVAS_HEIGHT, CANVAS_WIDTH};

fn start() -> BlockId {
    BlockId::from(START_BLOCK_ID)
}

fn add(workflow: &mut Workflow, kind: BlockType) -> BlockId {
    workflow.add_block(kind, Vec2::new(200.0, 200.0)).unwrap()
}

fn option_block(workflow: &mut Workflow, options: &[&str]) -> BlockId {
    let id = add(workflow, BlockType::Option);
    workflow
        .update_block(id.as_str(), BlockPatch::options(options.iter().copied()))
        .unwrap();
    id
}

#[test]
fn default_start_is_centred() {
    let workflow = Workflow::with_default_start();
    let start = workflow.start_block().unwrap();

    assert_eq!(start.pos(), Vec2::new(9840.0, 9900.0));
    assert_eq!(start.footprint().center(), Vec2::new(10000.0, 10000.0));
    workflow.validate().unwrap();
}

#[test]
fn ids_follow_type_and_are_never_reused() {
    let mut workflow = Workflow::with_default_start();

    let first = add(&mut workflow, BlockType::Message);
    let second = add(&mut workflow, BlockType::Message);
    let response = add(&mut workflow, BlockType::UserResponse);
    assert_eq!(first, "message1");
    assert_eq!(second, "message2");
    assert_eq!(response, "userResponse1");

    workflow.delete_block(second.as_str()).unwrap();
    let third = add(&mut workflow, BlockType::Message);
    assert_eq!(third, "message3");
}

#[test]
fn ids_continue_after_loaded_suffixes() {
    let blocks = vec![
        Block::new(start(), BlockType::Start, Vec2::ZERO),
        Block::new(BlockId::from("option7"), BlockType::Option, Vec2::ZERO),
    ];
    let (mut workflow, report) = Workflow::from_records(blocks, Vec::new());
    assert!(report.is_clean());

    assert_eq!(add(&mut workflow, BlockType::Option), "option8");
}

#[test]
fn exhausted_loaded_suffix_falls_back_to_a_free_id() {
    let blocks = vec![
        Block::new(start(), BlockType::Start, Vec2::ZERO),
        Block::new(BlockId::from("message4294967295"), BlockType::Message, Vec2::ZERO),
    ];
    let (mut workflow, _) = Workflow::from_records(blocks, Vec::new());

    assert_eq!(add(&mut workflow, BlockType::Message), "message1");
    assert_eq!(add(&mut workflow, BlockType::Message), "message2");
    workflow.validate().unwrap();
}

#[test]
fn second_start_is_rejected() {
    let mut workflow = Workflow::with_default_start();

    let result = workflow.add_block(BlockType::Start, Vec2::ZERO);

    assert_eq!(result, Err(Rejection::DuplicateStart));
    assert_eq!(workflow.blocks().len(), 1);
}

#[test]
fn start_can_be_recreated_after_deletion() {
    let mut workflow = Workflow::with_default_start();
    workflow.delete_block(START_BLOCK_ID).unwrap();

    let id = workflow.add_block(BlockType::Start, Vec2::ZERO).unwrap();

    assert_eq!(id, START_BLOCK_ID);
}

#[test]
fn positions_are_clamped_on_add_and_move() {
    let mut workflow = Workflow::new();
    let id = workflow
        .add_block(BlockType::Message, Vec2::new(-50.0, 99_999.0))
        .unwrap();
    assert_eq!(
        workflow.block(id.as_str()).unwrap().pos(),
        Vec2::new(0.0, CANVAS_HEIGHT - BLOCK_HEIGHT)
    );

    let applied = workflow
        .move_block(id.as_str(), Vec2::new(f32::INFINITY, 10.0))
        .unwrap();
    assert_eq!(applied, Vec2::new(0.0, 10.0));

    let applied = workflow
        .move_block(id.as_str(), Vec2::new(30_000.0, 10.0))
        .unwrap();
    assert_eq!(applied, Vec2::new(CANVAS_WIDTH - BLOCK_WIDTH, 10.0));
}

#[test]
fn translate_clamps_each_block_individually() {
    let mut workflow = Workflow::new();
    let near_edge = workflow
        .add_block(BlockType::Message, Vec2::new(10.0, 500.0))
        .unwrap();
    let inside = workflow
        .add_block(BlockType::Message, Vec2::new(1000.0, 500.0))
        .unwrap();

    let moved = workflow.translate_blocks([&near_edge, &inside], Vec2::new(-100.0, 0.0));

    assert_eq!(
        moved,
        vec![
            (near_edge, Vec2::new(0.0, 500.0)),
            (inside, Vec2::new(900.0, 500.0)),
        ]
    );
}

#[test]
fn new_blocks_get_type_defaults() {
    let mut workflow = Workflow::with_default_start();
    let end = add(&mut workflow, BlockType::End);
    let option = add(&mut workflow, BlockType::Option);

    let start = workflow.start_block().unwrap();
    assert!(!start.message.is_empty());
    assert_ne!(start.message, workflow.block(end.as_str()).unwrap().message);
    assert_eq!(
        workflow.block(option.as_str()).unwrap().options(),
        ["Option 1", "Option 2"]
    );
    assert!(workflow.block(end.as_str()).unwrap().options.is_none());
}

#[test]
fn update_rejects_options_on_non_option_blocks() {
    let mut workflow = Workflow::with_default_start();
    let message = add(&mut workflow, BlockType::Message);

    let result = workflow.update_block(message.as_str(), BlockPatch::options(["A"]));

    assert_eq!(result, Err(Rejection::OptionsNotSupported(BlockType::Message)));
}

#[test]
fn update_applies_text_fields() {
    let mut workflow = Workflow::with_default_start();
    let message = add(&mut workflow, BlockType::Message);

    let cascade = workflow
        .update_block(
            message.as_str(),
            BlockPatch {
                name: Some("Greeting".to_string()),
                message: Some("Welcome back".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    assert!(cascade.is_empty());
    let block = workflow.block(message.as_str()).unwrap();
    assert_eq!(block.name, "Greeting");
    assert_eq!(block.message, "Welcome back");
}

#[test]
fn shrinking_options_drops_vanished_outputs() {
    let mut workflow = Workflow::with_default_start();
    let option = option_block(&mut workflow, &["A", "B", "C"]);
    let first = add(&mut workflow, BlockType::Message);
    let third = add(&mut workflow, BlockType::Message);
    let kept = workflow.add_connection(&option, &first, Some(0)).unwrap();
    let dropped = workflow.add_connection(&option, &third, Some(2)).unwrap();

    let cascade = workflow
        .update_block(option.as_str(), BlockPatch::options(["A", "B"]))
        .unwrap();

    assert_eq!(cascade.removed_connections.len(), 1);
    assert_eq!(cascade.removed_connections[0].id, dropped);
    assert!(workflow.connection(kept.as_str()).is_some());
    assert_eq!(
        workflow.block(option.as_str()).unwrap().connections.output,
        vec![kept]
    );
}

#[test]
fn shrinking_options_clears_stale_selection() {
    let mut workflow = Workflow::with_default_start();
    let option = option_block(&mut workflow, &["Yes", "No", "Maybe"]);
    let condition = add(&mut workflow, BlockType::Condition);
    workflow.add_connection(&option, &condition, Some(0)).unwrap();
    workflow
        .update_block(
            condition.as_str(),
            BlockPatch {
                selected_condition: Some(Some("Maybe".to_string())),
                ..Default::default()
            },
        )
        .unwrap();

    let cascade = workflow
        .update_block(option.as_str(), BlockPatch::options(["Yes", "No"]))
        .unwrap();

    let condition_block = workflow.block(condition.as_str()).unwrap();
    assert_eq!(condition_block.condition_id, Some(option));
    assert_eq!(condition_block.selected_condition, None);
    assert_eq!(cascade.cleared_conditions, vec![condition]);
}

#[test]
fn selected_condition_must_be_listed() {
    let mut workflow = Workflow::with_default_start();
    let option = option_block(&mut workflow, &["Yes", "No"]);
    let condition = add(&mut workflow, BlockType::Condition);

    let unbound = workflow.update_block(
        condition.as_str(),
        BlockPatch {
            selected_condition: Some(Some("Yes".to_string())),
            ..Default::default()
        },
    );
    assert_eq!(unbound, Err(Rejection::ConditionNotBound));

    let unknown = workflow.update_block(
        condition.as_str(),
        BlockPatch {
            condition_id: Some(Some(option.clone())),
            selected_condition: Some(Some("Later".to_string())),
            ..Default::default()
        },
    );
    assert_eq!(unknown, Err(Rejection::UnknownOption("Later".to_string())));
    assert_eq!(workflow.block(condition.as_str()).unwrap().condition_id, None);

    workflow
        .update_block(
            condition.as_str(),
            BlockPatch {
                condition_id: Some(Some(option.clone())),
                selected_condition: Some(Some("No".to_string())),
                ..Default::default()
            },
        )
        .unwrap();
    let block = workflow.block(condition.as_str()).unwrap();
    assert_eq!(block.condition_id, Some(option));
    assert_eq!(block.selected_condition.as_deref(), Some("No"));
}

#[test]
fn condition_must_bind_to_an_option_block() {
    let mut workflow = Workflow::with_default_start();
    let message = add(&mut workflow, BlockType::Message);
    let condition = add(&mut workflow, BlockType::Condition);

    let result = workflow.update_block(
        condition.as_str(),
        BlockPatch {
            condition_id: Some(Some(message.clone())),
            ..Default::default()
        },
    );

    assert_eq!(result, Err(Rejection::NotAnOptionBlock(message)));
}

#[test]
fn deleting_option_block_cascades() {
    // start -> option["Yes","No"], option[1] -> end, then delete option.
    let mut workflow = Workflow::with_default_start();
    let option = option_block(&mut workflow, &["Yes", "No"]);
    let end = add(&mut workflow, BlockType::End);
    workflow.add_connection(&start(), &option, None).unwrap();
    workflow.add_connection(&option, &end, Some(1)).unwrap();
    assert_eq!(workflow.connections().len(), 2);

    let (removed, cascade) = workflow.delete_block(option.as_str()).unwrap();

    assert_eq!(removed.id, option);
    assert_eq!(cascade.removed_connections.len(), 2);
    assert!(workflow.connections().is_empty());
    assert!(workflow.block(end.as_str()).is_some());
    assert!(workflow.start_block().unwrap().connections.output.is_empty());
}

#[test]
fn deleting_option_block_unbinds_conditions() {
    let mut workflow = Workflow::with_default_start();
    let option = option_block(&mut workflow, &["Yes", "No"]);
    let condition = add(&mut workflow, BlockType::Condition);
    workflow
        .update_block(
            condition.as_str(),
            BlockPatch {
                condition_id: Some(Some(option.clone())),
                selected_condition: Some(Some("Yes".to_string())),
                ..Default::default()
            },
        )
        .unwrap();

    let (_, cascade) = workflow.delete_block(option.as_str()).unwrap();

    let block = workflow.block(condition.as_str()).unwrap();
    assert_eq!(block.condition_id, None);
    assert_eq!(block.selected_condition, None);
    assert_eq!(cascade.cleared_conditions, vec![condition]);
}

#[test]
fn deleting_missing_block_is_rejected() {
    let mut workflow = Workflow::with_default_start();

    let result = workflow.delete_block("message9");

    assert_eq!(
        result.map(|_| ()),
        Err(Rejection::BlockNotFound(BlockId::from("message9")))
    );
}

#[test]
fn connection_ids_are_unique_and_formatted() {
    let mut workflow = Workflow::with_default_start();
    let option = add(&mut workflow, BlockType::Option);
    let a = add(&mut workflow, BlockType::Message);
    let b = add(&mut workflow, BlockType::Message);

    let plain = workflow.add_connection(&start(), &option, None).unwrap();
    let first = workflow.add_connection(&option, &a, Some(0)).unwrap();
    let second = workflow.add_connection(&option, &a, Some(0)).unwrap();
    workflow.add_connection(&option, &b, Some(1)).unwrap();

    assert!(plain.as_str().starts_with("start-option1--"));
    assert!(first.as_str().starts_with("option1-message1-0-"));
    assert_ne!(first, second);
    assert_eq!(
        workflow.block(option.as_str()).unwrap().connections.output.len(),
        3
    );
}

#[test]
fn add_connection_checks_ports() {
    let mut workflow = Workflow::with_default_start();
    let end = add(&mut workflow, BlockType::End);
    let message = add(&mut workflow, BlockType::Message);
    let option = add(&mut workflow, BlockType::Option);

    assert_eq!(
        workflow.add_connection(&message, &start(), None),
        Err(Rejection::StartHasNoInput)
    );
    assert_eq!(
        workflow.add_connection(&end, &message, None),
        Err(Rejection::PortNotExposed {
            block_id: end.clone(),
            port: PortType::Output,
        })
    );
    assert_eq!(
        workflow.add_connection(&option, &message, None),
        Err(Rejection::PortNotExposed {
            block_id: option.clone(),
            port: PortType::Output,
        })
    );
    assert_eq!(
        workflow.add_connection(&option, &message, Some(2)),
        Err(Rejection::PortNotExposed {
            block_id: option,
            port: PortType::Output,
        })
    );
    assert_eq!(
        workflow.add_connection(&message, &message, None),
        Err(Rejection::SelfConnection)
    );
    assert!(workflow.connections().is_empty());
}

#[test]
fn deleting_binding_wire_clears_condition() {
    let mut workflow = Workflow::with_default_start();
    let option = option_block(&mut workflow, &["Yes", "No"]);
    let condition = add(&mut workflow, BlockType::Condition);
    let wire = workflow.add_connection(&option, &condition, Some(1)).unwrap();
    workflow
        .update_block(
            condition.as_str(),
            BlockPatch {
                selected_condition: Some(Some("No".to_string())),
                ..Default::default()
            },
        )
        .unwrap();

    let (removed, cascade) = workflow.delete_connection(wire.as_str()).unwrap();

    assert_eq!(removed.id, wire);
    assert_eq!(cascade.cleared_conditions, vec![condition.clone()]);
    let block = workflow.block(condition.as_str()).unwrap();
    assert_eq!(block.condition_id, None);
    assert_eq!(block.selected_condition, None);
    assert!(workflow.block(option.as_str()).unwrap().connections.output.is_empty());
}

#[test]
fn wired_condition_cannot_be_rebound_by_patch() {
    let mut workflow = Workflow::with_default_start();
    let wired = option_block(&mut workflow, &["Yes", "No"]);
    let other = option_block(&mut workflow, &["Yes", "No"]);
    let condition = add(&mut workflow, BlockType::Condition);
    workflow.add_connection(&wired, &condition, Some(0)).unwrap();

    let rebind = workflow.update_block(
        condition.as_str(),
        BlockPatch {
            condition_id: Some(Some(other)),
            ..Default::default()
        },
    );
    assert_eq!(
        rebind.map(|_| ()),
        Err(Rejection::ConditionAlreadyBound {
            condition: condition.clone(),
            option: wired.clone(),
        })
    );

    let unbind = workflow.update_block(
        condition.as_str(),
        BlockPatch {
            condition_id: Some(None),
            ..Default::default()
        },
    );
    assert!(unbind.is_err());

    let same = workflow.update_block(
        condition.as_str(),
        BlockPatch {
            condition_id: Some(Some(wired.clone())),
            selected_condition: Some(Some("No".to_string())),
            ..Default::default()
        },
    );
    assert!(same.is_ok());
    let block = workflow.block(condition.as_str()).unwrap();
    assert_eq!(block.condition_id, Some(wired));
    assert_eq!(block.selected_condition.as_deref(), Some("No"));
}

#[test]
fn bounding_box_spans_all_footprints() {
    let mut workflow = Workflow::new();
    assert!(workflow.bounding_box().is_none());

    workflow
        .add_block(BlockType::Message, Vec2::new(100.0, 100.0))
        .unwrap();
    workflow
        .add_block(BlockType::End, Vec2::new(1000.0, 50.0))
        .unwrap();

    let bounds = workflow.bounding_box().unwrap();
    assert_eq!(bounds.min, Vec2::new(100.0, 50.0));
    assert_eq!(bounds.max, Vec2::new(1320.0, 300.0));
}

// ----------------------------------------------------------------------------
// Sanitation of stored records
// ----------------------------------------------------------------------------

fn record(id: &str, kind: BlockType, position: Vec2) -> Block {
    Block::new(BlockId::from(id), kind, position)
}

fn link(id: &str, from: &str, to: &str, from_option_index: Option<usize>) -> Connection {
    Connection {
        id: ConnectionId::from(id),
        from: BlockId::from(from),
        to: BlockId::from(to),
        from_type: PortType::Output,
        to_type: PortType::Input,
        from_option_index,
    }
}

#[test]
fn sanitize_drops_extra_start_blocks() {
    let blocks = vec![
        record("start", BlockType::Start, Vec2::ZERO),
        record("start", BlockType::Start, Vec2::ZERO),
        record("start2", BlockType::Start, Vec2::ZERO),
    ];

    let (workflow, report) = Workflow::from_records(blocks, Vec::new());

    assert_eq!(workflow.blocks().len(), 1);
    assert_eq!(
        report.dropped_blocks,
        vec![BlockId::from("start"), BlockId::from("start2")]
    );
}

#[test]
fn sanitize_drops_non_start_block_with_start_id() {
    let blocks = vec![
        record("start", BlockType::Message, Vec2::ZERO),
        record("start", BlockType::Start, Vec2::ZERO),
    ];

    let (mut workflow, report) = Workflow::from_records(blocks, Vec::new());

    assert_eq!(report.dropped_blocks, vec![start()]);
    assert_eq!(workflow.blocks().len(), 1);
    assert_eq!(
        workflow.start_block().map(|block| block.kind),
        Some(BlockType::Start)
    );
    assert_eq!(
        workflow.add_block(BlockType::Start, Vec2::ZERO),
        Err(Rejection::DuplicateStart)
    );
}

#[test]
fn sanitize_without_start_allows_adding_one() {
    let blocks = vec![record("start", BlockType::Message, Vec2::ZERO)];

    let (mut workflow, _) = Workflow::from_records(blocks, Vec::new());

    assert!(workflow.start_block().is_none());
    assert_eq!(workflow.add_block(BlockType::Start, Vec2::ZERO), Ok(start()));
    assert_eq!(
        workflow.start_block().map(|block| block.kind),
        Some(BlockType::Start)
    );
}

#[test]
fn sanitize_clamps_out_of_range_positions() {
    let mut block = record("message1", BlockType::Message, Vec2::ZERO);
    block.position = Position {
        x: -10.0,
        y: 50_000.0,
    };

    let (workflow, report) = Workflow::from_records(vec![block], Vec::new());

    assert_eq!(
        workflow.block("message1").unwrap().pos(),
        Vec2::new(0.0, CANVAS_HEIGHT - BLOCK_HEIGHT)
    );
    assert_eq!(report.repaired_blocks, vec![BlockId::from("message1")]);
}

#[test]
fn sanitize_drops_invalid_connections() {
    let blocks = vec![
        record("start", BlockType::Start, Vec2::ZERO),
        record("option1", BlockType::Option, Vec2::ZERO),
        record("end1", BlockType::End, Vec2::ZERO),
    ];
    let mut inverted = link("inverted", "start", "option1", None);
    inverted.to_type = PortType::Output;
    let connections = vec![
        link("ok", "start", "option1", None),
        link("ok", "start", "end1", None),
        link("into-start", "option1", "start", Some(0)),
        link("missing", "option1", "message4", Some(0)),
        link("bad-index", "option1", "end1", Some(5)),
        link("from-end", "end1", "option1", None),
        inverted,
    ];

    let (workflow, report) = Workflow::from_records(blocks, connections);

    assert_eq!(workflow.connections().len(), 1);
    assert_eq!(report.dropped_connections.len(), 6);
    assert_eq!(
        workflow.start_block().unwrap().connections.output,
        vec![ConnectionId::from("ok")]
    );
    workflow.validate().unwrap();
}

#[test]
fn sanitize_clears_dangling_bindings() {
    let mut condition = record("condition1", BlockType::Condition, Vec2::ZERO);
    condition.condition_id = Some(BlockId::from("option9"));
    condition.selected_condition = Some("Yes".to_string());
    let mut bound = record("condition2", BlockType::Condition, Vec2::ZERO);
    bound.condition_id = Some(BlockId::from("option1"));
    bound.selected_condition = Some("Gone".to_string());
    let mut message = record("message1", BlockType::Message, Vec2::ZERO);
    message.options = Some(vec!["stray".to_string()]);
    let blocks = vec![
        record("option1", BlockType::Option, Vec2::ZERO),
        condition,
        bound,
        message,
    ];

    let (workflow, report) = Workflow::from_records(blocks, Vec::new());

    let condition = workflow.block("condition1").unwrap();
    assert_eq!(condition.condition_id, None);
    assert_eq!(condition.selected_condition, None);
    let bound = workflow.block("condition2").unwrap();
    assert_eq!(bound.condition_id, Some(BlockId::from("option1")));
    assert_eq!(bound.selected_condition, None);
    assert!(workflow.block("message1").unwrap().options.is_none());
    assert_eq!(report.repaired_blocks.len(), 3);
}

#[test]
fn sanitize_rebuilds_output_bookkeeping() {
    let mut start_block = record("start", BlockType::Start, Vec2::ZERO);
    start_block.connections.output = vec![
        ConnectionId::from("ghost"),
        ConnectionId::from("a"),
        ConnectionId::from("a"),
    ];
    let blocks = vec![
        start_block,
        record("message1", BlockType::Message, Vec2::ZERO),
    ];

    let (workflow, report) =
        Workflow::from_records(blocks, vec![link("a", "start", "message1", None)]);

    assert_eq!(
        workflow.start_block().unwrap().connections.output,
        vec![ConnectionId::from("a")]
    );
    assert_eq!(report.repaired_blocks, vec![BlockId::from("start")]);
}

// ----------------------------------------------------------------------------
// Invariants over random edit sequences
// ----------------------------------------------------------------------------

#[derive(Clone, Debug)]
enum Op {
    Add(usize, f32, f32),
    Delete(usize),
    Connect(usize, usize, Option<usize>),
    Disconnect(usize),
    SetOptions(usize, usize),
    Move(usize, f32, f32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let coord = -5_000.0f32..25_000.0;
    prop_oneof![
        (0usize..6, coord.clone(), coord.clone()).prop_map(|(k, x, y)| Op::Add(k, x, y)),
        (0usize..16).prop_map(Op::Delete),
        (0usize..16, 0usize..16, proptest::option::of(0usize..4))
            .prop_map(|(a, b, i)| Op::Connect(a, b, i)),
        (0usize..16).prop_map(Op::Disconnect),
        (0usize..16, 0usize..4).prop_map(|(b, n)| Op::SetOptions(b, n)),
        (0usize..16, coord.clone(), coord).prop_map(|(b, x, y)| Op::Move(b, x, y)),
    ]
}

fn id_at(workflow: &Workflow, index: usize) -> Option<BlockId> {
    let blocks = workflow.blocks();
    (!blocks.is_empty()).then(|| blocks[index % blocks.len()].id.clone())
}

fn apply(workflow: &mut Workflow, op: Op) {
    let kinds = [
        BlockType::Start,
        BlockType::Option,
        BlockType::Condition,
        BlockType::Message,
        BlockType::End,
        BlockType::UserResponse,
    ];
    match op {
        Op::Add(kind, x, y) => {
            let _ = workflow.add_block(kinds[kind], Vec2::new(x, y));
        }
        Op::Delete(index) => {
            if let Some(id) = id_at(workflow, index) {
                let _ = workflow.delete_block(id.as_str());
            }
        }
        Op::Connect(a, b, option_index) => {
            if let (Some(from), Some(to)) = (id_at(workflow, a), id_at(workflow, b)) {
                let _ = workflow.add_connection(&from, &to, option_index);
            }
        }
        Op::Disconnect(index) => {
            let connections = workflow.connections();
            if !connections.is_empty() {
                let id = connections[index % connections.len()].id.clone();
                let _ = workflow.delete_connection(id.as_str());
            }
        }
        Op::SetOptions(index, count) => {
            if let Some(id) = id_at(workflow, index) {
                let options: Vec<String> = (0..count).map(|i| format!("Choice {i}")).collect();
                let _ = workflow.update_block(id.as_str(), BlockPatch::options(options));
            }
        }
        Op::Move(index, x, y) => {
            if let Some(id) = id_at(workflow, index) {
                let _ = workflow.move_block(id.as_str(), Vec2::new(x, y));
            }
        }
    }
}

proptest! {
    #[test]
    fn edits_preserve_invariants(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        let mut workflow = Workflow::with_default_start();
        for op in ops {
            apply(&mut workflow, op);

            prop_assert!(workflow.validate().is_ok());
            let starts = workflow
                .blocks()
                .iter()
                .filter(|block| block.kind == BlockType::Start)
                .count();
            prop_assert!(starts <= 1);
            for block in workflow.blocks() {
                prop_assert!((0.0..=CANVAS_WIDTH - BLOCK_WIDTH).contains(&block.position.x));
                prop_assert!((0.0..=CANVAS_HEIGHT - BLOCK_HEIGHT).contains(&block.position.y));
            }
            for connection in workflow.connections() {
                let target = workflow.block(connection.to.as_str());
                prop_assert!(target.is_some_and(|block| block.kind != BlockType::Start));
            }
        }
    }

    #[test]
    fn block_deletion_removes_touching_connections(
        ops in proptest::collection::vec(op_strategy(), 1..40),
        victim in 0usize..16,
    ) {
        let mut workflow = Workflow::with_default_start();
        for op in ops {
            apply(&mut workflow, op);
        }
        let Some(id) = id_at(&workflow, victim) else {
            return Ok(());
        };
        let was_option = workflow.block(id.as_str()).is_some_and(|b| b.kind == BlockType::Option);

        workflow.delete_block(id.as_str()).unwrap();

        prop_assert!(workflow.connections().iter().all(|c| !c.touches(&id)));
        if was_option {
            prop_assert!(workflow.blocks().iter().all(|b| b.condition_id.as_ref() != Some(&id)));
        }
    }
}
