use std::collections::HashMap;

use maud::{DOCTYPE, Markup, html};
use sea_orm::{ActiveEnum, Iterable};
use uuid::Uuid;

use crate::{
    admin::{
        form::{Field, FieldKind},
        inline::{self, Choice, GenreRow, InlineState, PersonRow},
        resources::{Listing, Resource},
    },
    entities::person_film_work::Role,
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

const INPUT_CLASS: &str = "mt-1 w-full rounded-md border border-gray-300 px-3 py-2 focus:border-blue-500 focus:outline-none focus:ring-1 focus:ring-blue-500";
const BUTTON_CLASS: &str =
    "rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700";

/// Everything needed to render an add or change form.
pub struct FormPage<'a> {
    pub resource: Resource,
    pub id: Option<Uuid>,
    pub values: &'a HashMap<String, String>,
    pub error: Option<&'a str>,
    pub inline: Option<&'a InlineState>,
}

pub fn list_url(resource: Resource) -> String {
    format!("/admin/{}/", resource.slug())
}

pub fn change_url(resource: Resource, id: Uuid) -> String {
    format!("/admin/{}/{id}", resource.slug())
}

pub fn admin_index() -> String {
    page(
        "Site administration",
        html! {
            h1 class="text-3xl font-bold text-gray-900" { "Site administration" }
            div class="mt-8 bg-white shadow rounded-lg divide-y" {
                @for resource in Resource::ALL {
                    div class="flex items-center justify-between px-6 py-4" {
                        a class="font-medium text-blue-600 hover:text-blue-800" href=(list_url(resource)) {
                            (capitalize(resource.descriptor().plural))
                        }
                        a class="text-sm text-gray-500 hover:text-gray-700" href=(format!("/admin/{}/add", resource.slug())) { "+ Add" }
                    }
                }
            }
        },
    )
}

pub fn change_list(resource: Resource, listing: &Listing, query: &str) -> String {
    let d = resource.descriptor();
    let page_url = |n: u64| {
        format!("{}?q={}&page={n}", list_url(resource), urlencoding::encode(query))
    };

    page(
        &capitalize(d.plural),
        html! {
            (breadcrumbs(Some(resource)))
            div class="flex items-center justify-between" {
                h1 class="text-3xl font-bold text-gray-900" { "Select " (d.name) " to change" }
                a class=(BUTTON_CLASS) href=(format!("/admin/{}/add", d.slug)) { "Add " (d.name) }
            }

            form class="mt-6 flex gap-2" method="get" action=(list_url(resource)) {
                input class=(INPUT_CLASS) type="search" name="q" value=(query) placeholder=(format!("Search by {}", d.search_hint));
                button class=(BUTTON_CLASS) type="submit" { "Search" }
            }

            p class="mt-4 text-sm text-gray-500" { (listing.page.count) " " (if listing.page.count == 1 { d.name } else { d.plural }) }

            div class="mt-4 bg-white shadow rounded-lg overflow-hidden" {
                table class="min-w-full divide-y divide-gray-200" {
                    thead class="bg-gray-50" {
                        tr {
                            @for column in d.columns {
                                th class="px-6 py-3 text-left text-xs font-medium uppercase text-gray-500" { (column) }
                            }
                        }
                    }
                    tbody class="divide-y divide-gray-200" {
                        @for row in &listing.rows {
                            tr {
                                @for (i, cell) in row.cells.iter().enumerate() {
                                    td class="px-6 py-3 text-sm text-gray-700" {
                                        @if i == 0 {
                                            a class="text-blue-600 hover:text-blue-800" href=(change_url(resource, row.id)) { (cell) }
                                        } @else {
                                            (cell)
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            @if listing.page.total_pages > 1 {
                div class="mt-4 flex gap-4 text-sm" {
                    @if let Some(prev) = listing.page.prev() {
                        a class="text-blue-600 hover:text-blue-800" href=(page_url(prev)) { "Previous" }
                    }
                    span class="text-gray-500" { "Page " (listing.page.number) " of " (listing.page.total_pages) }
                    @if let Some(next) = listing.page.next() {
                        a class="text-blue-600 hover:text-blue-800" href=(page_url(next)) { "Next" }
                    }
                }
            }
        },
    )
}

pub fn change_form(form: &FormPage<'_>) -> String {
    let d = form.resource.descriptor();
    let (heading, action) = match form.id {
        Some(id) => (format!("Change {}", d.name), change_url(form.resource, id)),
        None => (format!("Add {}", d.name), format!("/admin/{}/add", d.slug)),
    };

    page(
        &heading,
        html! {
            (breadcrumbs(Some(form.resource)))
            h1 class="text-3xl font-bold text-gray-900" { (heading) }

            @if let Some(error) = form.error {
                div class="mt-6 rounded-md border border-red-300 bg-red-50 p-4 text-red-800" { (error) }
            }

            form class="mt-6 space-y-6" method="post" action=(action) {
                div class="bg-white shadow rounded-lg p-8 space-y-6" {
                    @for field in d.fields {
                        (field_input(field, form.values.get(field.name).map(String::as_str).unwrap_or("")))
                    }
                }

                @if let Some(state) = form.inline {
                    (genre_inline(state))
                    (person_inline(state))
                }

                div class="flex items-center justify-between" {
                    button class=(BUTTON_CLASS) type="submit" { "Save" }
                    @if let Some(id) = form.id {
                        a class="text-red-600 hover:text-red-800" href=(format!("{}/delete", change_url(form.resource, id))) { "Delete" }
                    }
                }
            }
        },
    )
}

pub fn delete_confirm(resource: Resource, id: Uuid, name: &str) -> String {
    let d = resource.descriptor();
    page(
        "Are you sure?",
        html! {
            (breadcrumbs(Some(resource)))
            div class="bg-white shadow rounded-lg p-8" {
                h1 class="text-2xl font-bold text-gray-900" { "Are you sure?" }
                p class="mt-4 text-gray-700" {
                    "Deleting the " (d.name) " \"" (name) "\" also removes its genre and person links."
                }
                form class="mt-6 flex gap-4" method="post" action=(format!("{}/delete", change_url(resource, id))) {
                    button class="rounded-md bg-red-600 px-4 py-2 font-semibold text-white hover:bg-red-700" type="submit" { "Yes, I'm sure" }
                    a class="px-4 py-2 text-gray-700 hover:text-gray-900" href=(change_url(resource, id)) { "No, take me back" }
                }
            }
        },
    )
}

pub fn error_page(message: String) -> String {
    page(
        "Error",
        html! {
            div class="bg-white shadow rounded-lg p-8" {
                h1 class="text-2xl font-bold text-gray-900" { "Error" }
                p class="mt-4 text-gray-700" { (message) }
                a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/admin/" { "Back" }
            }
        },
    )
}

fn page(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " | Movies admin" }
                script src=(TAILWIND_CDN) {}
            }
            body class="min-h-screen bg-gray-50" {
                div class="max-w-5xl mx-auto px-6 py-10" { (body) }
            }
        }
    }
    .into_string()
}

fn breadcrumbs(resource: Option<Resource>) -> Markup {
    html! {
        nav class="mb-6 text-sm text-gray-500" {
            a class="hover:text-gray-700" href="/admin/" { "Home" }
            @if let Some(resource) = resource {
                " › "
                a class="hover:text-gray-700" href=(list_url(resource)) { (capitalize(resource.descriptor().plural)) }
            }
        }
    }
}

fn field_input(field: &Field, value: &str) -> Markup {
    let control = match field.kind {
        FieldKind::Text { max_len } => html! {
            input class=(INPUT_CLASS) type="text" id=(field.name) name=(field.name) value=(value) maxlength=(max_len) required[field.required];
        },
        FieldKind::TextArea => html! {
            textarea class=(INPUT_CLASS) id=(field.name) name=(field.name) rows="4" { (value) }
        },
        FieldKind::Date => html! {
            input class=(INPUT_CLASS) type="date" id=(field.name) name=(field.name) value=(value) required[field.required];
        },
        FieldKind::Float { min, max } => html! {
            input class=(INPUT_CLASS) type="number" step="any" id=(field.name) name=(field.name) value=(value) min=(min) max=(max) required[field.required];
        },
        FieldKind::Choice(choices) => html! {
            select class=(INPUT_CLASS) id=(field.name) name=(field.name) required[field.required] {
                option value="" { "---------" }
                @for (code, label) in choices {
                    option value=(code) selected[*code == value] { (label) }
                }
            }
        },
    };

    html! {
        div {
            label class="block text-sm font-medium text-gray-700" for=(field.name) {
                (field.label)
                @if field.required { " *" }
            }
            (control)
        }
    }
}

fn choice_select(name: &str, choices: &[Choice], selected: Option<Uuid>) -> Markup {
    html! {
        select class=(INPUT_CLASS) name=(name) {
            option value="" { "---------" }
            @for choice in choices {
                option value=(choice.id.to_string()) selected[Some(choice.id) == selected] { (choice.label) }
            }
        }
    }
}

fn hidden_id(name: &str, id: Option<Uuid>) -> Markup {
    html! {
        @if let Some(id) = id {
            input type="hidden" name=(name) value=(id.to_string());
        }
    }
}

fn delete_toggle(name: &str, row_id: Option<Uuid>, checked: bool) -> Markup {
    html! {
        @if row_id.is_some() {
            input type="checkbox" name=(name) checked[checked];
        }
    }
}

fn genre_inline(state: &InlineState) -> Markup {
    let p = inline::GENRE_PREFIX;
    let rows: Vec<GenreRow> =
        state.genres.iter().cloned().chain(std::iter::once(GenreRow::default())).collect();

    html! {
        div class="bg-white shadow rounded-lg p-8" {
            h2 class="text-lg font-semibold text-gray-900" { "Genres" }
            input type="hidden" name=(inline::total_name(p)) value=(rows.len());
            table class="mt-4 min-w-full" {
                thead {
                    tr {
                        th class="text-left text-xs font-medium uppercase text-gray-500" { "Genre" }
                        th class="w-24 text-left text-xs font-medium uppercase text-gray-500" { "Delete?" }
                    }
                }
                tbody {
                    @for (i, row) in rows.iter().enumerate() {
                        tr {
                            td class="py-2 pr-4" {
                                (hidden_id(&inline::field_name(p, i, "id"), row.id))
                                (choice_select(&inline::field_name(p, i, "genre"), &state.genre_choices, row.genre_id))
                            }
                            td class="py-2" { (delete_toggle(&inline::field_name(p, i, "DELETE"), row.id, row.delete)) }
                        }
                    }
                }
            }
        }
    }
}

fn person_inline(state: &InlineState) -> Markup {
    let p = inline::PERSON_PREFIX;
    let rows: Vec<PersonRow> =
        state.persons.iter().cloned().chain(std::iter::once(PersonRow::default())).collect();

    html! {
        div class="bg-white shadow rounded-lg p-8" {
            h2 class="text-lg font-semibold text-gray-900" { "Persons" }
            input type="hidden" name=(inline::total_name(p)) value=(rows.len());
            table class="mt-4 min-w-full" {
                thead {
                    tr {
                        th class="text-left text-xs font-medium uppercase text-gray-500" { "Person" }
                        th class="text-left text-xs font-medium uppercase text-gray-500" { "Role" }
                        th class="w-24 text-left text-xs font-medium uppercase text-gray-500" { "Delete?" }
                    }
                }
                tbody {
                    @for (i, row) in rows.iter().enumerate() {
                        tr {
                            td class="py-2 pr-4" {
                                (hidden_id(&inline::field_name(p, i, "id"), row.id))
                                (choice_select(&inline::field_name(p, i, "person"), &state.person_choices, row.person_id))
                            }
                            td class="py-2 pr-4" {
                                select class=(INPUT_CLASS) name=(inline::field_name(p, i, "role")) {
                                    option value="" { "---------" }
                                    @for role in Role::iter() {
                                        option value=(role.to_value()) selected[Some(role) == row.role] { (role.label()) }
                                    }
                                }
                            }
                            td class="py-2" { (delete_toggle(&inline::field_name(p, i, "DELETE"), row.id, row.delete)) }
                        }
                    }
                }
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::resources::film_work_form;

    #[test]
    fn capitalizes_plural_names() {
        assert_eq!(capitalize("filmworks"), "Filmworks");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn choice_field_marks_current_value() {
        let html = field_input(&film_work_form::TYPE, "tv_show").into_string();
        assert!(html.contains(r#"<option value="tv_show" selected>TV Show</option>"#));
        assert!(html.contains(r#"<option value="movie">Movie</option>"#));
    }

    #[test]
    fn inline_sections_offer_one_blank_row() {
        let state = InlineState {
            genres: vec![GenreRow { id: Some(Uuid::new_v4()), genre_id: None, delete: false }],
            ..Default::default()
        };
        let html = genre_inline(&state).into_string();
        assert!(html.contains(r#"name="genres-TOTAL" value="2""#));
        assert!(html.contains(r#"name="genres-0-DELETE""#));
        assert!(!html.contains(r#"name="genres-1-DELETE""#));
    }
}
