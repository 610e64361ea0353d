/// Resolves a source string to its localized form
///
/// The actual catalog lookup belongs to the host; this crate only defines the
/// seam.
pub type StringResolver<'a> = &'a dyn Fn(&str) -> String;

/// A UI control that can localize its own user-facing strings
///
/// Implemented directly by each control type and invoked explicitly after
/// construction; there is no runtime patching of constructors.
pub trait Localizable {
    fn localize(&mut self, resolver: StringResolver<'_>);
}

/// Localize a batch of freshly constructed controls
pub fn localize_all(controls: &mut [&mut dyn Localizable], resolver: StringResolver<'_>) {
    for control in controls.iter_mut() {
        control.localize(resolver);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Label {
        text: String,
    }

    impl Localizable for Label {
        fn localize(&mut self, resolver: StringResolver<'_>) {
            self.text = resolver(&self.text);
        }
    }

    struct Button {
        title: String,
        tooltip: String,
    }

    impl Localizable for Button {
        fn localize(&mut self, resolver: StringResolver<'_>) {
            self.title = resolver(&self.title);
            self.tooltip = resolver(&self.tooltip);
        }
    }

    fn upper(s: &str) -> String {
        s.to_uppercase()
    }

    #[test]
    fn label_localizes_its_text() {
        let mut label = Label {
            text: "settings".into(),
        };
        label.localize(&upper);
        assert_eq!(label.text, "SETTINGS");
    }

    #[test]
    fn localize_all_touches_every_control() {
        let mut label = Label {
            text: "time".into(),
        };
        let mut button = Button {
            title: "go".into(),
            tooltip: "go to object".into(),
        };

        localize_all(&mut [&mut label, &mut button], &upper);

        assert_eq!(label.text, "TIME");
        assert_eq!(button.title, "GO");
        assert_eq!(button.tooltip, "GO TO OBJECT");
    }

    #[test]
    fn localize_is_repeatable() {
        // Second pass with an identity resolver leaves strings alone
        let mut label = Label {
            text: "mark".into(),
        };
        label.localize(&upper);
        label.localize(&|s: &str| s.to_string());
        assert_eq!(label.text, "MARK");
    }
}
