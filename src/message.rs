use crate::state::Message as Msg;
use chrono::{DateTime, Local, TimeZone};
use leptos::*;
use pulldown_cmark::{Event, Parser};
use std::fmt::Display;

/// Markdown to HTML. Raw HTML in a message is shown as text, never injected.
pub fn render_markdown(text: &str) -> String {
    let parser = Parser::new(text).map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        event => event,
    });
    let mut parsed = String::new();
    pulldown_cmark::html::push_html(&mut parsed, parser);
    parsed
}

pub fn format_day<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    date.format("%a %b %d %Y").to_string()
}

pub fn format_stamp<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    date.format("%a %b %d %Y - %-I:%M:%S %p").to_string()
}

#[component]
pub fn Message(
    message: Msg,
    mine: bool,
    #[prop(into)] editing: Signal<bool>,
    draft: RwSignal<String>,
    on_edit: Callback<()>,
    on_save: Callback<()>,
    on_cancel: Callback<()>,
    on_delete: Callback<()>,
) -> impl IntoView {
    let parsed = render_markdown(&message.text);
    let stamp = format_stamp(&DateTime::<Local>::from(message.created_at));
    let button = "px-2 py-1 rounded text-white text-sm font-semibold";
    view! {
        <div class="flex items-start m-5 gap-2.5" class:flex-row-reverse=move || mine>
            <div class="flex flex-col gap-1 max-w-[90%]">
                <div class="flex items-center space-x-2 rtl:space-x-reverse">
                    <span class="text-sm font-semibold text-gray-900 dark:text-white">
                        {message.user.username.clone()}
                    </span>
                    <span class="text-sm font-normal text-gray-500 dark:text-gray-400">
                        {stamp}
                    </span>
                </div>
                <div class="flex flex-col leading-1.5 p-4 border-gray-200 bg-gray-100 rounded-e-xl rounded-es-xl dark:bg-gray-700">
                    {move || {
                        if editing.get() {
                            view! {
                                <input
                                    type="text"
                                    class="p-2 rounded bg-gray-200 text-gray-800"
                                    placeholder="Edit message"
                                    prop:value=draft
                                    on:input=move |ev| draft.set(event_target_value(&ev))
                                />
                            }
                                .into_view()
                        } else {
                            view! {
                                <div
                                    class="text-sm font-normal text-gray-900 dark:text-white"
                                    inner_html=parsed.clone()
                                />
                            }
                                .into_view()
                        }
                    }}
                </div>
            </div>
            <Show when=move || mine>
                <div class="flex self-center gap-2">
                    {move || {
                        if editing.get() {
                            view! {
                                <button
                                    type="button"
                                    class=format!("{button} bg-green-500")
                                    on:click=move |_| on_save.call(())
                                >
                                    Save
                                </button>
                                <button
                                    type="button"
                                    class=format!("{button} bg-gray-500")
                                    on:click=move |_| on_cancel.call(())
                                >
                                    Cancel
                                </button>
                            }
                                .into_view()
                        } else {
                            view! {
                                <button
                                    type="button"
                                    class=format!("{button} bg-yellow-500")
                                    on:click=move |_| on_edit.call(())
                                >
                                    Edit
                                </button>
                                <button
                                    type="button"
                                    class=format!("{button} bg-red-500")
                                    on:click=move |_| on_delete.call(())
                                >
                                    Delete
                                </button>
                            }
                                .into_view()
                        }
                    }}
                </div>
            </Show>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_markdown() {
        assert_eq!(render_markdown("hello world"), "<p>hello world</p>\n");
        assert_eq!(
            render_markdown("hello **pony**"),
            "<p>hello <strong>pony</strong></p>\n"
        );
        let code = render_markdown("Run it:\n\n```bash\nrustc main.rs\n```");
        assert!(code.contains("<pre><code class=\"language-bash\">rustc main.rs\n</code></pre>"));
    }

    #[test]
    fn raw_html_is_escaped() {
        let parsed = render_markdown("<script>alert(1)</script>");
        assert!(!parsed.contains("<script>"));
        assert!(parsed.contains("&lt;script&gt;"));

        let inline = render_markdown("a <b>bold</b> claim");
        assert!(!inline.contains("<b>"));
    }

    #[test]
    fn dates() {
        let date = Utc.with_ymd_and_hms(2023, 10, 17, 15, 4, 5).unwrap();
        assert_eq!(format_day(&date), "Tue Oct 17 2023");
        assert_eq!(format_stamp(&date), "Tue Oct 17 2023 - 3:04:05 PM");
    }
}
