//! The ordered set of fields shown as table columns.

/// Ordered, duplicate-free list of field names the user has chosen to display.
///
/// Order defines column order. Mutations report whether they changed anything
/// so callers only persist effective changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplaySelection {
    fields: Vec<String>,
}

impl DisplaySelection {
    /// Build a selection from an ordered sequence, dropping later duplicates.
    #[must_use]
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Self::default();
        for field in fields {
            selection.add(field);
        }
        selection
    }

    /// Append `field` if not already present.
    ///
    /// Returns `false` when the field was already selected.
    pub fn add(&mut self, field: impl Into<String>) -> bool {
        let field = field.into();
        if self.contains(&field) {
            return false;
        }
        self.fields.push(field);
        true
    }

    /// Remove the first occurrence of `field`.
    ///
    /// Returns `false` when the field was not selected.
    pub fn remove(&mut self, field: &str) -> bool {
        match self.fields.iter().position(|f| f == field) {
            Some(idx) => {
                self.fields.remove(idx);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate field names in column order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(String::as_str)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.fields
    }
}

impl From<Vec<String>> for DisplaySelection {
    fn from(fields: Vec<String>) -> Self {
        Self::from_fields(fields)
    }
}
