//! 发送 OTP 页
//!
//! 与登录页同一个表单，走独立的 send-otp 端点；
//! 校验页的 "Resend" 链接也落到这里。

use crate::api::{MutationState, use_api};
use crate::components::login::sanitize_phone;
use crate::components::notify::use_notify;
use crate::session::use_session;
use crate::web::route::AppRoute;
use crate::web::router::use_navigate;
use leptos::prelude::*;
use topnotes_shared::protocol::SendOtpRequest;

#[component]
pub fn SendOtpPage() -> impl IntoView {
    let client = use_api();
    let session = use_session();
    let notify = use_notify();
    let navigate = use_navigate();

    // 从校验页回流时带出上次的手机号
    let (phone, set_phone) = signal(session.otp_phone().unwrap_or_default());
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
            state.run(client, SendOtpRequest::new(number.clone()), move || {
                session.stash_otp_phone(&number);
                notify.success("OTP sent to your phone");
                navigate(AppRoute::VerifyOtp);
            });
        }
    };

    view! {
        <div class="flex items-center justify-center min-h-screen bg-base-200">
            <div class="card w-full max-w-md shadow-2xl bg-base-100">
                <form class="card-body" on:submit=on_submit>
                    <h2 class="card-title">"Request a new OTP"</h2>
                    <p class="text-sm text-base-content/70">
                        "Enter the mobile number registered for the admin account."
                    </p>

                    <Show when=move || state.error.get().is_some()>
                        <div role="alert" class="alert alert-error text-sm py-2">
                            <span>{move || state.error.get().unwrap().user_message()}</span>
                        </div>
                    </Show>

                    <div class="form-control">
                        <label class="label" for="otp-phone">
                            <span class="label-text">"Mobile number"</span>
                        </label>
                        <input
                            id="otp-phone"
                            type="tel"
                            inputmode="numeric"
                            placeholder="9876543210"
                            on:input=move |ev| set_phone.set(sanitize_phone(&event_target_value(&ev)))
                            prop:value=phone
                            class="input input-bordered"
                            required
                        />
                    </div>
                    <div class="form-control mt-4">
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
    }
}
