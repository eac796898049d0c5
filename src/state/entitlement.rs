use tokio::sync::watch;

/// Premium flag of the signed-in user.
pub struct Entitlement {
    premium: watch::Sender<bool>,
}

impl Entitlement {
    /// Start as a free-tier user until the backend says otherwise.
    pub fn new() -> Self {
        let (premium, _rx) = watch::channel(false);
        Self { premium }
    }

    /// Current flag.
    pub fn is_premium(&self) -> bool {
        *self.premium.borrow()
    }

    /// Store the flag, returning whether it changed.
    pub fn set(&self, premium: bool) -> bool {
        self.premium.send_if_modified(|current| {
            if *current == premium {
                false
            } else {
                *current = premium;
                true
            }
        })
    }
}

impl Default for Entitlement {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_reports_changes_only() {
        let entitlement = Entitlement::new();
        assert!(!entitlement.is_premium());
        assert!(entitlement.set(true));
        assert!(!entitlement.set(true));
        assert!(entitlement.is_premium());
    }
}
