//! Server-rendered HTML pages. Kept as plain string builders so the
//! markup stays greppable next to the handlers that serve it.

use crate::auth::session::SessionUser;
use crate::users::dto::format_birthdate;
use crate::users::repo::User;

/// Escapes text for safe interpolation into HTML bodies and attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, nav: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n</head>\n<body>\n\
         <nav>{nav}</nav>\n<main>\n{body}\n</main>\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn nav_for(viewer: Option<&SessionUser>) -> String {
    match viewer {
        Some(user) => format!(
            "<a href=\"/\">Home</a> \
             <a href=\"/profile\">My profile</a> \
             <a href=\"/cgv\">Terms</a> \
             <form method=\"post\" action=\"/logout\" style=\"display:inline\">\
             <button type=\"submit\">Log out ({})</button></form>",
            escape(&user.username)
        ),
        None => "<a href=\"/\">Home</a> \
                 <a href=\"/signup\">Sign up</a> \
                 <a href=\"/login\">Log in</a> \
                 <a href=\"/cgv\">Terms</a>"
            .to_string(),
    }
}

fn error_banner(error: Option<&str>) -> String {
    match error {
        Some(msg) => format!("<p class=\"error\">{}</p>", escape(msg)),
        None => String::new(),
    }
}

pub fn home_page(users: &[User], viewer: Option<&SessionUser>) -> String {
    let mut items = String::new();
    for user in users {
        items.push_str(&format!(
            "<li><a href=\"/profile/{id}\">{name}</a></li>\n",
            id = user.id,
            name = escape(&user.username),
        ));
    }
    let body = format!("<h1>Members</h1>\n<ul>\n{items}</ul>");
    layout("Home", &nav_for(viewer), &body)
}

pub fn signup_page(error: Option<&str>, success: Option<&str>) -> String {
    let banner = match success {
        Some(msg) => format!("<p class=\"success\">{}</p>", escape(msg)),
        None => error_banner(error),
    };
    let body = format!(
        "<h1>Sign up</h1>\n{banner}\
         <form method=\"post\" action=\"/signup\" enctype=\"multipart/form-data\">\n\
         <label>Username <input type=\"text\" name=\"username\" required></label><br>\n\
         <label>Password <input type=\"password\" name=\"password\" required></label><br>\n\
         <label>Birthdate <input type=\"date\" name=\"birthdate\" required></label><br>\n\
         <label>Profile image <input type=\"file\" name=\"profileImage\" accept=\"image/*\"></label><br>\n\
         <button type=\"submit\">Create account</button>\n</form>\n\
         <p><a href=\"/login\">Already have an account? Log in</a></p>"
    );
    layout("Sign up", &nav_for(None), &body)
}

pub fn login_page(error: Option<&str>) -> String {
    let body = format!(
        "<h1>Log in</h1>\n{banner}\
         <form method=\"post\" action=\"/login\">\n\
         <label>Username <input type=\"text\" name=\"username\" required></label><br>\n\
         <label>Password <input type=\"password\" name=\"password\" required></label><br>\n\
         <button type=\"submit\">Log in</button>\n</form>\n\
         <p><a href=\"/signup\">Need an account? Sign up</a></p>",
        banner = error_banner(error),
    );
    layout("Log in", &nav_for(None), &body)
}

fn profile_body(
    username: &str,
    birthdate: &str,
    image_user_id: Option<uuid::Uuid>,
    is_same_user: bool,
) -> String {
    let image = match image_user_id {
        Some(id) => format!(
            "<img src=\"/profile-image/{id}\" alt=\"Profile image of {name}\" width=\"160\">\n",
            name = escape(username),
        ),
        None => String::new(),
    };
    let edit = if is_same_user {
        "<p><a href=\"/edit-profile\">Edit profile</a></p>\n"
    } else {
        ""
    };
    format!(
        "<h1>{name}</h1>\n{image}\
         <dl>\n<dt>Username</dt><dd>{name}</dd>\n\
         <dt>Birthdate</dt><dd>{birthdate}</dd>\n</dl>\n{edit}",
        name = escape(username),
        birthdate = escape(birthdate),
    )
}

pub fn profile_page(user: &User, is_same_user: bool) -> String {
    let body = profile_body(
        &user.username,
        &format_birthdate(user.birthdate),
        Some(user.id),
        is_same_user,
    );
    layout("Profile", &nav_for(None), &body)
}

/// Profile rendered from the session snapshot alone, without a store read.
pub fn session_profile_page(user: &SessionUser) -> String {
    let body = profile_body(
        &user.username,
        &format_birthdate(user.birthdate),
        Some(user.id),
        true,
    );
    layout("My profile", &nav_for(Some(user)), &body)
}

pub fn edit_profile_page(username: &str, birthdate: &str, error: Option<&str>) -> String {
    let body = format!(
        "<h1>Edit profile</h1>\n{banner}\
         <form method=\"post\" action=\"/update-profile\">\n\
         <label>Username <input type=\"text\" name=\"username\" value=\"{name}\" required></label><br>\n\
         <label>Birthdate <input type=\"date\" name=\"birthdate\" value=\"{birthdate}\" required></label><br>\n\
         <button type=\"submit\">Save</button>\n</form>",
        banner = error_banner(error),
        name = escape(username),
        birthdate = escape(birthdate),
    );
    layout("Edit profile", &nav_for(None), &body)
}

pub fn terms_page() -> String {
    let body = "<h1>Terms of service</h1>\n\
                <p>By creating an account you agree that your username, birthdate and \
                profile image are shown to other members of this site.</p>\n\
                <p>Accounts are personal. Do not share your password.</p>";
    layout("Terms of service", &nav_for(None), body)
}

pub fn error_page(message: &str) -> String {
    let body = format!(
        "<h1>Something went wrong</h1>\n<p>{}</p>\n<p><a href=\"/\">Back to home</a></p>",
        escape(message)
    );
    layout("Error", &nav_for(None), &body)
}
