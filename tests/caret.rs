use typing_particles::{
    caret::{CaretLocator, MIRROR_ID},
    utils::{get_body, get_document, get_window},
};
use wasm_bindgen_test::*;
use web_sys::{
    wasm_bindgen::JsCast, Element, HtmlElement, HtmlInputElement, HtmlTextAreaElement, Node,
};

wasm_bindgen_test_configure!(run_in_browser);

fn append(tag: &str) -> Element {
    let document = get_document().expect("document");
    let element = document.create_element(tag).expect("element");
    get_body(&document)
        .expect("body")
        .append_child(&element)
        .expect("append");
    element
}

#[wasm_bindgen_test]
fn password_fields_are_never_measured() {
    let input = append("input").unchecked_into::<HtmlInputElement>();
    input.set_type("password");
    input.set_value("hunter2");
    input.focus().expect("focus");

    let mut locator = CaretLocator::new().expect("locator");
    assert_eq!(locator.detect(&input), None);
    assert!(get_document()
        .expect("document")
        .get_element_by_id(MIRROR_ID)
        .is_none());
    input.remove();
}

#[wasm_bindgen_test]
fn unsupported_elements_yield_nothing() {
    let div = append("div");
    div.set_text_content(Some("plain text"));
    let mut locator = CaretLocator::new().expect("locator");
    assert_eq!(locator.detect(&div), None);
    div.remove();
}

#[wasm_bindgen_test]
fn input_caret_moves_with_the_text() {
    let input = append("input").unchecked_into::<HtmlInputElement>();
    input.set_value("ab");
    input.focus().expect("focus");
    input.set_selection_range(0, 0).expect("selection");

    let mut locator = CaretLocator::new().expect("locator");
    let start = locator.detect(&input).expect("caret at start");
    input.set_value("abcdefgh");
    input.set_selection_range(8, 8).expect("selection");
    let end = locator.detect(&input).expect("caret at end");
    assert!(end.x > start.x);

    let bounds = input.get_bounding_client_rect();
    assert!(start.x >= bounds.left());
    assert!(start.y >= bounds.top() && start.y <= bounds.bottom());

    locator.teardown();
    assert!(get_document()
        .expect("document")
        .get_element_by_id(MIRROR_ID)
        .is_none());
    input.remove();
}

#[wasm_bindgen_test]
fn textarea_caret_moves_down_on_new_lines() {
    let area = append("textarea").unchecked_into::<HtmlTextAreaElement>();
    area.set_rows(4);
    area.set_value("one\ntwo\nthree");
    area.focus().expect("focus");

    let mut locator = CaretLocator::new().expect("locator");
    area.set_selection_range(1, 1).expect("selection");
    let first = locator.detect(&area).expect("first line");
    area.set_selection_range(10, 10).expect("selection");
    let third = locator.detect(&area).expect("third line");
    assert!(third.y > first.y);

    locator.teardown();
    area.remove();
}

#[wasm_bindgen_test]
fn empty_editable_restores_the_selection() {
    let div = append("div").unchecked_into::<HtmlElement>();
    div.set_content_editable("true");
    div.focus().expect("focus");

    let window = get_window().expect("window");
    let document = get_document().expect("document");
    let selection = window.get_selection().expect("selection").expect("selection");
    let range = document.create_range().expect("range");
    range.select_node_contents(&div).expect("select");
    range.collapse_with_to_start(true);
    selection.remove_all_ranges().expect("clear");
    selection.add_range(&range).expect("add");

    let mut locator = CaretLocator::new().expect("locator");
    assert!(locator.detect(&div).is_some());

    assert_eq!(selection.range_count(), 1);
    let restored = selection.get_range_at(0).expect("range");
    assert!(restored.collapsed());
    let container = restored.start_container().expect("container");
    let div_node: &Node = div.as_ref();
    assert!(container.is_same_node(Some(div_node)));
    assert_eq!(restored.start_offset().expect("offset"), 0);
    assert_eq!(div.child_nodes().length(), 0);
    div.remove();
}

#[wasm_bindgen_test]
fn editable_detection_keeps_a_text_selection() {
    let div = append("div").unchecked_into::<HtmlElement>();
    div.set_content_editable("true");
    div.set_text_content(Some("hello world"));
    div.focus().expect("focus");
    let text = div.first_child().expect("text node");

    let window = get_window().expect("window");
    let document = get_document().expect("document");
    let selection = window.get_selection().expect("selection").expect("selection");
    let range = document.create_range().expect("range");
    range.set_start(&text, 2).expect("start");
    range.set_end(&text, 7).expect("end");
    selection.remove_all_ranges().expect("clear");
    selection.add_range(&range).expect("add");

    let mut locator = CaretLocator::new().expect("locator");
    assert!(locator.detect(&div).is_some());

    assert_eq!(selection.range_count(), 1);
    let restored = selection.get_range_at(0).expect("range");
    assert!(!restored.collapsed());
    assert!(restored
        .start_container()
        .expect("start container")
        .is_same_node(Some(&text)));
    assert_eq!(restored.start_offset().expect("start offset"), 2);
    assert!(restored
        .end_container()
        .expect("end container")
        .is_same_node(Some(&text)));
    assert_eq!(restored.end_offset().expect("end offset"), 7);
    assert_eq!(selection.to_string(), "llo w");
    assert_eq!(div.text_content().as_deref(), Some("hello world"));
    div.remove();
}
