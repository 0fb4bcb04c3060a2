//! Data lists: sortable, selectable rows with search criteria.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use formkit_core::logging::model_span;
use formkit_core::{FormkitError, FormkitResult};
use serde_json::Value as Json;
use tracing::Instrument;

use super::{DataObject, ExportOptions, FieldCriteria, ImportOptions, ObjectChange, ObjectKind};
use crate::row::{DataRow, SelectionMode};
use crate::sort::ListSortField;
use crate::state::Modified;

pub(crate) struct DataListState {
    rows: RefCell<Vec<Rc<DataRow>>>,
    sort_criteria: RefCell<Vec<ListSortField>>,
    pub(super) criteria: Option<Rc<DataObject>>,
    applied: RefCell<Option<Vec<FieldCriteria>>>,
    selection_mode: Cell<SelectionMode>,
}

impl DataListState {
    pub(super) fn new(
        criteria: Option<Rc<DataObject>>,
        sort: Vec<ListSortField>,
        selection: SelectionMode,
    ) -> Self {
        Self {
            rows: RefCell::new(Vec::new()),
            sort_criteria: RefCell::new(sort),
            criteria,
            applied: RefCell::new(None),
            selection_mode: Cell::new(selection),
        }
    }
}

impl DataObject {
    fn data_list_state(&self) -> Option<&DataListState> {
        match &self.kind {
            ObjectKind::DataList(state) => Some(state),
            _ => None,
        }
    }

    /// Whether this object is a data list.
    pub const fn is_data_list(&self) -> bool {
        matches!(self.kind, ObjectKind::DataList(_))
    }

    /// The rows of a data list, in display order.
    pub fn rows(&self) -> Vec<Rc<DataRow>> {
        self.data_list_state()
            .map(|s| s.rows.borrow().clone())
            .unwrap_or_default()
    }

    /// The criteria object of a data list.
    pub fn criteria_object(&self) -> Option<&Rc<Self>> {
        self.data_list_state().and_then(|s| s.criteria.as_ref())
    }

    // ── Sorting ──────────────────────────────────────────────────────

    /// The current sort criteria.
    pub fn sort_criteria(&self) -> Vec<ListSortField> {
        self.data_list_state()
            .map(|s| s.sort_criteria.borrow().clone())
            .unwrap_or_default()
    }

    /// Replaces the sort criteria and re-sorts the rows.
    pub fn set_sort_criteria(&self, criteria: Vec<ListSortField>) {
        let Some(state) = self.data_list_state() else {
            return;
        };
        *state.sort_criteria.borrow_mut() = criteria;
        self.changed.send(&ObjectChange::SortCriteria);
        self.sort();
    }

    /// Sorts the rows by the current criteria. Rows that compare equal keep
    /// their order.
    pub fn sort(&self) {
        let Some(state) = self.data_list_state() else {
            return;
        };
        let criteria = state.sort_criteria.borrow().clone();
        if criteria.is_empty() {
            return;
        }
        let mut rows = state.rows.take();
        rows.sort_by(|a, b| a.compare_to(b, &criteria));
        *state.rows.borrow_mut() = rows;
        self.changed.send(&ObjectChange::Rows);
    }

    // ── Rows ─────────────────────────────────────────────────────────

    /// Removes every row and the applied criteria, and resets the criteria
    /// object too if `full` is set.
    pub fn reset_list(&self, full: bool) {
        let Some(state) = self.data_list_state() else {
            return;
        };
        state.rows.borrow_mut().clear();
        *state.applied.borrow_mut() = None;
        self.set_modified(Modified::Unset);
        if full {
            if let Some(criteria) = &state.criteria {
                criteria.reset();
            }
        }
        self.changed.send(&ObjectChange::Rows);
        self.changed.send(&ObjectChange::AppliedCriteria);
    }

    pub(super) fn import_rows(
        &self,
        state: &DataListState,
        json: &Json,
        options: ImportOptions,
    ) -> FormkitResult<()> {
        let Json::Array(records) = json else {
            return Err(FormkitError::Serialization(format!(
                "expected an array for data list '{self}', got {json}"
            )));
        };
        let Some(this) = self.rc() else {
            return Ok(());
        };
        let selected = if options.preserve_selection {
            self.selected_rows()
        } else {
            Vec::new()
        };
        let keys: Vec<ListSortField> = self
            .properties()
            .filter(|p| p.is_key())
            .map(|p| ListSortField::new(p.name()))
            .collect();

        let rows: Vec<Rc<DataRow>> = records
            .iter()
            .map(|record| {
                let row = DataRow::new(&this);
                row.from_json(record);
                if !keys.is_empty() {
                    let same = selected.iter().any(|old| old.compare_to(&row, &keys).is_eq());
                    row.set_selected(same);
                }
                row
            })
            .collect();
        tracing::debug!(object = %self, rows = rows.len(), "data list imported");

        *state.rows.borrow_mut() = rows;
        self.sort();
        *state.applied.borrow_mut() = Some(
            state
                .criteria
                .as_ref()
                .map(|c| c.fields_criteria())
                .unwrap_or_default(),
        );
        self.set_modified(Modified::Clean);
        self.changed.send(&ObjectChange::Rows);
        self.changed.send(&ObjectChange::AppliedCriteria);
        Ok(())
    }

    pub(super) fn export_rows(&self, state: &DataListState, options: &ExportOptions) -> Json {
        let rows = state.rows.borrow();
        Json::Array(
            rows.iter()
                .map(|row| row.to_json(options.contract.as_ref()))
                .collect(),
        )
    }

    // ── Applied criteria ─────────────────────────────────────────────

    /// The criteria the current rows were searched with, or `None` before
    /// the first search.
    pub fn applied_criteria(&self) -> Option<Vec<FieldCriteria>> {
        self.data_list_state().and_then(|s| s.applied.borrow().clone())
    }

    /// The applied criteria as one line, e.g. `Status: Is Open; Age: Between 1 and 5`.
    pub fn applied_criteria_text(&self) -> String {
        self.applied_criteria()
            .unwrap_or_default()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    // ── Selection ────────────────────────────────────────────────────

    /// The row selection mode.
    pub fn row_selection_mode(&self) -> SelectionMode {
        self.data_list_state()
            .map_or(SelectionMode::None, |s| s.selection_mode.get())
    }

    /// Sets the row selection mode.
    pub fn set_row_selection_mode(&self, mode: SelectionMode) {
        if let Some(state) = self.data_list_state() {
            state.selection_mode.set(mode);
        }
    }

    /// Flips the selection of `row`. Selecting a row deselects the others
    /// unless the list allows multiple selection.
    pub fn toggle_selection(&self, row: &Rc<DataRow>) {
        let select = !row.is_selected();
        if select && self.row_selection_mode() != SelectionMode::Multiple {
            for other in self.rows().iter().filter(|r| !Rc::ptr_eq(r, row)) {
                other.set_selected(false);
            }
        }
        row.set_selected(select);
        self.changed.send(&ObjectChange::Selection);
    }

    /// The selected rows, in display order.
    pub fn selected_rows(&self) -> Vec<Rc<DataRow>> {
        self.rows().into_iter().filter(|r| r.is_selected()).collect()
    }

    /// Selects exactly the given rows.
    pub fn set_selected_rows(&self, rows: &[Rc<DataRow>]) {
        for row in self.rows() {
            row.set_selected(false);
        }
        for row in rows {
            row.set_selected(true);
        }
        self.changed.send(&ObjectChange::Selection);
    }

    /// Deselects every row.
    pub fn clear_selected_rows(&self) {
        self.set_selected_rows(&[]);
    }

    // ── Search ───────────────────────────────────────────────────────

    /// Validates the criteria and, if they have no errors, reads the rows
    /// through the handler. A rejected search returns
    /// [`FormkitError::Validation`] and never reaches the handler.
    pub async fn search_async(&self, preserve_selection: bool) -> FormkitResult<()> {
        self.search(preserve_selection)
            .instrument(model_span("search", &self.name()))
            .await
    }

    async fn search(&self, preserve_selection: bool) -> FormkitResult<()> {
        self.validate(true);
        let errors = self.validation_errors();
        if errors.has_errors() {
            tracing::warn!(errors = errors.len(), "search rejected by validation");
            return Err(FormkitError::Validation(errors));
        }
        if let Some(json) = self.handler.do_read(self).await? {
            self.import(&json, ImportOptions { preserve_selection })?;
        }
        Ok(())
    }
}
