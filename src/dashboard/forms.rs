//! The two ways of adding a transaction: describing it to the assistant, or
//! entering the label and amount by hand.

use maud::{Markup, html};

use crate::{
    endpoints,
    html::{
        BUTTON_AI_STYLE, BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, loading_spinner,
    },
};

/// Example sentences shown under the assistant input.
const AI_INPUT_EXAMPLES: [&str; 2] = ["今天买咖啡花了35元", "发工资了20000元"];

/// The free-text input that is sent to the assistant.
///
/// The input and button are disabled while the request is in flight.
pub(super) fn ai_input_form() -> Markup {
    html! {
        section
            class="w-full mb-8 p-6 rounded-lg border border-purple-100 dark:border-purple-900
                bg-gradient-to-r from-purple-50 to-blue-50 dark:from-gray-800 dark:to-gray-800"
        {
            h2 class="text-lg font-bold mb-2 text-purple-900 dark:text-purple-200" { "✨ AI bookkeeping" }

            p class="text-sm text-purple-600 dark:text-purple-300 mb-4"
            {
                "Try: "
                @for (i, example) in AI_INPUT_EXAMPLES.iter().enumerate() {
                    @if i > 0 { " or " }
                    q data-example { (example) }
                }
            }

            form
                id="ai-form"
                hx-post=(endpoints::AI_TRANSACTIONS_API)
                hx-target="#alert-container"
                hx-target-error="#alert-container"
                hx-indicator="#ai-submit"
                hx-disabled-elt="#ai-text, #ai-submit"
                data-reset-on-success
                class="flex gap-2"
            {
                input
                    id="ai-text"
                    name="text"
                    type="text"
                    placeholder="Tell the assistant what you spent or earned..."
                    required
                    autocomplete="off"
                    class={ "flex-1 " (FORM_TEXT_INPUT_STYLE) };

                button id="ai-submit" type="submit" class=(BUTTON_AI_STYLE)
                {
                    span id="ai-indicator" class="htmx-indicator"
                    {
                        (loading_spinner())
                        "Thinking…"
                    }
                    span class="[.htmx-request_&]:hidden" { "Send" }
                }
            }
        }
    }
}

/// The form for entering a transaction by hand.
pub(super) fn manual_transaction_form() -> Markup {
    html! {
        section class={ "w-full mb-8 " (CARD_STYLE) }
        {
            h2 class="text-lg font-bold mb-4" { "Add a transaction" }

            form
                id="manual-form"
                hx-post=(endpoints::TRANSACTIONS_API)
                hx-target="#alert-container"
                hx-target-error="#alert-container"
                hx-disabled-elt="#manual-submit"
                data-reset-on-success
                class="flex flex-col sm:flex-row gap-4 sm:items-end"
            {
                div class="flex-1"
                {
                    label for="label" class=(FORM_LABEL_STYLE) { "Label" }

                    input
                        id="label"
                        name="label"
                        type="text"
                        placeholder="e.g. taxi, salary"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div class="sm:w-40"
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount (¥)" }

                    input
                        id="amount"
                        name="amount"
                        type="number"
                        step="0.01"
                        placeholder="-35.00"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div class="sm:w-32"
                {
                    button id="manual-submit" type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add" }
                }
            }
        }
    }
}
