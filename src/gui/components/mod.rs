pub mod layout_editor;
