use factorclaim_core::ServiceError;

/// Collects field errors so one response reports all of them, e.g.
/// `"name: must be 1-100 characters, wattage: must be greater than 0"`.
#[derive(Debug, Default)]
pub(crate) struct Validator {
    errors: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Length in characters must be within `min..=max`.
    pub fn len(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let n = value.chars().count();
        if n < min || n > max {
            if min == 0 {
                self.fail(field, &format!("must be at most {max} characters"));
            } else {
                self.fail(field, &format!("must be {min}-{max} characters"));
            }
        }
        self
    }

    /// Like [`Validator::len`], skipped when the value is absent.
    pub fn opt_len(
        &mut self,
        field: &str,
        value: Option<&str>,
        min: usize,
        max: usize,
    ) -> &mut Self {
        if let Some(v) = value {
            self.len(field, v, min, max);
        }
        self
    }

    pub fn positive(&mut self, field: &str, value: f64) -> &mut Self {
        if value.is_nan() || value <= 0.0 {
            self.fail(field, "must be greater than 0");
        }
        self
    }

    /// A loose shape check: one `@`, non-empty local part, dotted domain.
    pub fn email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            self.len(field, v, 0, 100);
            let ok = match v.split_once('@') {
                Some((local, domain)) => {
                    !local.is_empty()
                        && !domain.contains('@')
                        && domain.contains('.')
                        && !domain.starts_with('.')
                        && !domain.ends_with('.')
                }
                None => false,
            };
            if !ok {
                self.fail(field, "not a valid email address");
            }
        }
        self
    }

    pub fn check(&mut self, ok: bool, field: &str, msg: &str) -> &mut Self {
        if !ok {
            self.fail(field, msg);
        }
        self
    }

    fn fail(&mut self, field: &str, msg: &str) {
        self.errors.push(format!("{field}: {msg}"));
    }

    pub fn finish(&mut self) -> Result<(), ServiceError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(std::mem::take(&mut self.errors).join(", ")))
        }
    }
}
