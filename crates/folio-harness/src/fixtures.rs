#![forbid(unsafe_code)]

//! A representative portfolio document.
//!
//! Layout in document coordinates, with the default 1280x800 window:
//!
//! ```text
//!    0 ─ nav#navbar (fixed chrome, 70px)
//!    0 ─ section#home.hero-section      [0, 800)
//!  800 ─ section#about                  [800, 1500)
//!          .stat-number[data-count=150]   @ 900
//!          [data-aos][data-aos-delay=200] @ 1000
//!          .pro-skill-fill (width 90%)    @ 1300
//! 1500 ─ section#projects               [1500, 2500)
//!          .project-card                  @ 1600
//!          img[loading=lazy]              @ 1700
//!          img (no loading attributes)    @ 1900
//! 2500 ─ section#contact                [2500, 3400)
//!          form#contactForm               @ 2600
//!          img[loading=lazy] (map)        @ 3300
//! ```

use folio_core::page::ElementId;

use crate::page::{El, FakePage};

/// Handles to the contact form parts.
#[derive(Debug, Clone, Copy)]
pub struct FormParts {
    pub form: ElementId,
    pub name: ElementId,
    pub email: ElementId,
    pub subject: ElementId,
    pub message: ElementId,
    pub button: ElementId,
    pub label: ElementId,
    pub spinner: ElementId,
    pub status: ElementId,
}

/// Which optional form parts to leave out.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormOmissions {
    pub spinner: bool,
    pub status: bool,
}

fn field(
    page: &mut FakePage,
    form: ElementId,
    tag: &str,
    name: &str,
    ty: &str,
    required: bool,
) -> ElementId {
    let group = page.append(form, El::new("div").class("form-group"));
    let mut el = El::new(tag).id(name).attr("name", name);
    if tag == "input" {
        el = el.attr("type", ty);
    }
    if required {
        el = el.attr("required", "");
    }
    let input = page.append(group, el);
    page.append(group, El::new("span").class("form-error"));
    input
}

/// Build `#contactForm` under `parent`.
pub fn contact_form(page: &mut FakePage, parent: ElementId, omit: FormOmissions) -> FormParts {
    let form = page.append(parent, El::new("form").id("contactForm").at(2600.0, 600.0));
    let name = field(page, form, "input", "name", "text", true);
    let email = field(page, form, "input", "email", "email", true);
    let subject = field(page, form, "input", "subject", "text", false);
    let message = field(page, form, "textarea", "message", "", true);
    let button = page.append(
        form,
        El::new("button").class("btn btn-submit").attr("type", "submit"),
    );
    let label = page.append(button, El::new("span").class("btn-text").text("Send Message"));
    let spinner = if omit.spinner {
        label
    } else {
        page.append(
            button,
            El::new("span").class("btn-loading").style("display", "none"),
        )
    };
    let status = if omit.status {
        form
    } else {
        page.append(form, El::new("div").id("formStatus").class("form-status"))
    };
    FormParts {
        form,
        name,
        email,
        subject,
        message,
        button,
        label,
        spinner,
        status,
    }
}

fn navigation(page: &mut FakePage) {
    let nav = page.add(El::new("nav").id("navbar").class("navbar").at(0.0, 70.0));
    let wrapper = page.append(nav, El::new("div").class("nav-wrapper"));
    let menu = page.append(wrapper, El::new("ul").id("navMenu").class("nav-menu"));
    for section in ["home", "about", "projects", "contact"] {
        let item = page.append(menu, El::new("li"));
        page.append(
            item,
            El::new("a")
                .class("nav-link")
                .attr("href", &format!("#{section}"))
                .text(section),
        );
    }
    page.append(wrapper, El::new("button").id("mobileMenuBtn"));
}

/// Everything but the contact form; returns the `#contact` section.
fn skeleton() -> (FakePage, ElementId) {
    let mut page = FakePage::default();
    navigation(&mut page);

    let home = page.add(El::new("section").id("home").class("hero-section").at(0.0, 800.0));
    page.append(
        home,
        El::new("a").class("btn").attr("href", "#contact").at(400.0, 40.0),
    );
    page.append(home, El::new("a").class("logo").attr("href", "#").at(20.0, 30.0));

    let about = page.add(El::new("section").id("about").at(800.0, 700.0));
    page.append(
        about,
        El::new("span")
            .class("stat-number")
            .attr("data-count", "150")
            .text("0")
            .at(900.0, 40.0),
    );
    page.append(
        about,
        El::new("div")
            .attr("data-aos", "fade-up")
            .attr("data-aos-delay", "200")
            .at(1000.0, 200.0),
    );
    page.append(
        about,
        El::new("div")
            .class("pro-skill-fill")
            .style("width", "90%")
            .at(1300.0, 10.0),
    );

    let projects = page.add(El::new("section").id("projects").at(1500.0, 1000.0));
    let card = page.append(projects, El::new("div").class("project-card").at(1600.0, 400.0));
    page.append(card, El::new("h3").class("project-title").text("Rope Editor"));
    let links = page.append(card, El::new("div").class("project-links"));
    page.append(
        links,
        El::new("a")
            .attr("href", "https://github.com/hadi-hannawi1/rope")
            .at(1950.0, 20.0),
    );
    page.append(
        projects,
        El::new("img")
            .attr("loading", "lazy")
            .attr("src", "shot.webp")
            .at(1700.0, 200.0),
    );
    page.append(projects, El::new("img").attr("src", "logo.png").at(1900.0, 100.0));

    let contact = page.add(El::new("section").id("contact").at(2500.0, 900.0));
    page.append(
        contact,
        El::new("img")
            .attr("loading", "lazy")
            .attr("src", "map.webp")
            .at(3300.0, 80.0),
    );

    page.add(El::new("button").id("scrollTopBtn"));
    (page, contact)
}

/// Full page, optionally without the contact form.
#[must_use]
pub fn portfolio_with(form: Option<FormOmissions>) -> (FakePage, Option<FormParts>) {
    let (mut page, contact) = skeleton();
    let parts = form.map(|omit| contact_form(&mut page, contact, omit));
    (page, parts)
}

/// Full page with a complete contact form.
#[must_use]
pub fn portfolio() -> (FakePage, FormParts) {
    let (mut page, contact) = skeleton();
    let parts = contact_form(&mut page, contact, FormOmissions::default());
    (page, parts)
}
