use super::TemplateKind;

/// A notification rendered into its subject and both body variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Link the recipient follows to complete the flow. Password-changed notices
/// carry no link.
pub fn action_url(app_base_url: &str, kind: TemplateKind, token: Option<&str>) -> Option<String> {
    let token = token?;
    let path = match kind {
        TemplateKind::Verify => "verify-email",
        TemplateKind::Reset => "reset-password",
        TemplateKind::PasswordChanged => return None,
    };
    Some(format!("{}/{}?token={}", app_base_url.trim_end_matches('/'), path, token))
}

pub fn render(kind: TemplateKind, to: &str, action_url: Option<&str>) -> RenderedMail {
    match (kind, action_url) {
        (TemplateKind::Verify, Some(url)) => verification(to, url),
        (TemplateKind::Reset, Some(url)) => password_reset(to, url),
        (TemplateKind::PasswordChanged, _) => password_changed(to),
        // Link-bearing templates without a token fall back to a plain notice
        (kind, None) => RenderedMail {
            subject: kind.subject().to_string(),
            text: format!("Hi {},\n\n{}.\n", to, kind.subject()),
            html: format!("<p>Hi {},</p>\n<p>{}.</p>\n", to, kind.subject()),
        },
    }
}

fn verification(to: &str, url: &str) -> RenderedMail {
    let text = format!(
        "Hi {},\n\n\
         Thank you for registering. Open the link below to verify your email address:\n\n\
         {}\n\n\
         If you did not register, please ignore this email.\n",
        to, url
    );
    let html = format!(
        r#"
        <p>Hi {},</p>
        <p>Thank you for registering. Please click the link below to verify your email address:</p>
        <p><a href='{}'>Verify my email</a></p>
        <p>If you did not register, please ignore this email.</p>
    "#,
        to, url
    );

    RenderedMail {
        subject: TemplateKind::Verify.subject().to_string(),
        text,
        html,
    }
}

fn password_reset(to: &str, url: &str) -> RenderedMail {
    let text = format!(
        "Hi {},\n\n\
         We received a request to reset your password. The link below expires shortly:\n\n\
         {}\n\n\
         If you did not ask for a reset, you can ignore this email.\n",
        to, url
    );
    let html = format!(
        r#"
        <p>Hi {},</p>
        <p>We received a request to reset your password. The link below expires shortly:</p>
        <p><a href='{}'>Reset my password</a></p>
        <p>If you did not ask for a reset, you can ignore this email.</p>
    "#,
        to, url
    );

    RenderedMail {
        subject: TemplateKind::Reset.subject().to_string(),
        text,
        html,
    }
}

fn password_changed(to: &str) -> RenderedMail {
    let text = format!(
        "Hi {},\n\n\
         The password for your account was just changed and every active session was signed out.\n\n\
         If this was not you, reset your password immediately.\n",
        to
    );
    let html = format!(
        r#"
        <p>Hi {},</p>
        <p>The password for your account was just changed and every active session was signed out.</p>
        <p>If this was not you, reset your password immediately.</p>
    "#,
        to
    );

    RenderedMail {
        subject: TemplateKind::PasswordChanged.subject().to_string(),
        text,
        html,
    }
}
