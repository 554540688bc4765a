//! 管理员登录入口（手机号）

use crate::api::{MutationState, use_api};
use crate::components::icons::Phone;
use crate::components::notify::use_notify;
use crate::session::use_session;
use crate::web::route::AppRoute;
use crate::web::router::use_navigate;
use leptos::prelude::*;
use topnotes_shared::protocol::SendOtpRequest;

/// 手机号输入过滤：只保留数字，最长 10 位
pub(crate) fn sanitize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).take(10).collect()
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let client = use_api();
    let session = use_session();
    let notify = use_notify();
    let navigate = use_navigate();

    let (phone, set_phone) = signal(String::new());
    let state = MutationState::new();

    let on_submit = {
        let navigate = navigate.clone();
        move |ev: leptos::web_sys::SubmitEvent| {
            ev.prevent_default();
            let number = phone.get();
            if number.len() != 10 {
                notify.error("Enter a valid 10-digit mobile number");
                return;
            }

            let client = client.clone();
            let session = session.clone();
            let navigate = navigate.clone();
            // 登录第一步就是下发 OTP，不走 /auth/login
            state.run(client, SendOtpRequest::new(number.clone()), move || {
                // OTP 已下发，手机号入库供刷新后的校验页兜底
                session.stash_otp_phone(&number);
                notify.success("OTP sent to your phone");
                navigate(AppRoute::VerifyOtp);
            });
        }
    };

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content flex-col w-full max-w-md">
                <div class="text-center mb-4">
                    <div class="flex flex-col items-center gap-2">
                        <div class="p-3 bg-primary/10 rounded-2xl text-primary">
                            <Phone attr:class="h-8 w-8" />
                        </div>
                        <h1 class="text-3xl font-bold">"Admin sign in"</h1>
                        <p class="text-base-content/70">
                            "We will send a one-time password to your phone"
                        </p>
                    </div>
                </div>

                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <form class="card-body" on:submit=on_submit>
                        <Show when=move || state.error.get().is_some()>
                            <div role="alert" class="alert alert-error text-sm py-2">
                                <span>{move || state.error.get().unwrap().user_message()}</span>
                            </div>
                        </Show>

                        <div class="form-control">
                            <label class="label" for="phone">
                                <span class="label-text">"Mobile number"</span>
                            </label>
                            <input
                                id="phone"
                                type="tel"
                                inputmode="numeric"
                                placeholder="9876543210"
                                on:input=move |ev| set_phone.set(sanitize_phone(&event_target_value(&ev)))
                                prop:value=phone
                                class="input input-bordered"
                                required
                            />
                        </div>
                        <div class="form-control mt-6">
                            <button class="btn btn-primary" disabled=move || state.pending.get()>
                                {move || if state.pending.get() {
                                    view! { <span class="loading loading-spinner"></span> "Sending..." }.into_any()
                                } else {
                                    "Send OTP".into_any()
                                }}
                            </button>
                        </div>
                    </form>
                </div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::sanitize_phone;

    #[test]
    fn phone_filter_strips_non_digits_and_caps_length() {
        assert_eq!(sanitize_phone("98765 43210"), "9876543210");
        assert_eq!(sanitize_phone("+91-9876543210"), "9198765432");
        assert_eq!(sanitize_phone("abc"), "");
    }
}
