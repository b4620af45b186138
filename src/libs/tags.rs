//! Autocomplete rules for the tag input.
//!
//! The selected tags belong to the host; every operation that would change
//! them takes the current selection and returns the new one.

#[derive(Clone, Debug)]
pub struct TagPicker {
    suggested: Vec<String>,
    /// Tags the user created that were not suggested
    custom: Vec<String>,
    input: String,
    arrow_index: usize,
    arrow_select: bool,
    add_new_to_list: bool,
}

impl TagPicker {
    pub fn new<I, S>(suggested: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suggested: suggested.into_iter().map(Into::into).collect(),
            custom: Vec::new(),
            input: String::new(),
            arrow_index: 0,
            arrow_select: false,
            add_new_to_list: true,
        }
    }

    pub fn set_add_new_to_list(self, add_new_to_list: bool) -> Self {
        Self {
            add_new_to_list,
            ..self
        }
    }

    /// Suggested tags followed by custom ones, without duplicates.
    pub fn options(&self) -> Vec<&str> {
        let mut options: Vec<&str> = Vec::with_capacity(self.suggested.len() + self.custom.len());
        for tag in self.suggested.iter().chain(self.custom.iter()) {
            if !options.contains(&tag.as_str()) {
                options.push(tag);
            }
        }
        options
    }

    /// Options matching the current input (case-insensitive substring) that
    /// are not selected yet.
    pub fn filtered(&self, selected: &[String]) -> Vec<&str> {
        let needle = self.input.to_lowercase();
        self.options()
            .into_iter()
            .filter(|opt| opt.to_lowercase().contains(&needle))
            .filter(|opt| !selected.iter().any(|s| s == opt))
            .collect()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input<T: Into<String>>(&mut self, input: T) {
        self.input = input.into();
        self.arrow_index = 0;
        self.arrow_select = false;
    }

    pub fn arrow_index(&self) -> usize {
        self.arrow_index
    }

    pub fn is_arrow_selecting(&self) -> bool {
        self.arrow_select
    }

    pub fn move_up(&mut self, selected: &[String]) {
        let len = self.filtered(selected).len();
        self.arrow_select = true;
        self.arrow_index = if self.arrow_index > 0 {
            self.arrow_index - 1
        } else {
            len.saturating_sub(1)
        };
    }

    pub fn move_down(&mut self, selected: &[String]) {
        let len = self.filtered(selected).len();
        self.arrow_select = true;
        self.arrow_index = if self.arrow_index + 1 < len {
            self.arrow_index + 1
        } else {
            0
        };
    }

    pub fn cancel_selection(&mut self) {
        self.arrow_select = false;
        self.arrow_index = 0;
    }

    /// Resolve Enter: a single exact match wins, then the arrow selection,
    /// then the raw input.
    pub fn submit(&mut self, selected: &[String]) -> Option<Vec<String>> {
        let choice = {
            let filtered = self.filtered(selected);
            let exact_match =
                filtered.len() == 1 && filtered[0].to_lowercase() == self.input.to_lowercase();
            if exact_match {
                filtered[0].to_string()
            } else if let Some(opt) = filtered
                .get(self.arrow_index)
                .filter(|_| self.arrow_select)
            {
                opt.to_string()
            } else {
                self.input.clone()
            }
        };
        self.add(selected, &choice)
    }

    /// Add `tag` to the selection. Blank and duplicate tags are ignored.
    pub fn add(&mut self, selected: &[String], tag: &str) -> Option<Vec<String>> {
        let tag = tag.trim();
        if tag.is_empty() || selected.iter().any(|s| s == tag) {
            return None;
        }
        if self.add_new_to_list
            && !self.suggested.iter().any(|s| s == tag)
            && !self.custom.iter().any(|s| s == tag)
        {
            self.custom.push(tag.to_string());
        }
        self.set_input(String::new());

        let mut next = selected.to_vec();
        next.push(tag.to_string());
        Some(next)
    }

    pub fn remove(selected: &[String], tag: &str) -> Vec<String> {
        selected.iter().filter(|s| *s != tag).cloned().collect()
    }

    pub fn remove_last(selected: &[String]) -> Option<Vec<String>> {
        let last = selected.last()?;
        Some(Self::remove(selected, last))
    }
}
