//! OTP 校验页
//!
//! 手机号从 `otp_phone` 存储键兜底（页面刷新后依然可用）；
//! 校验成功即持久化会话，并按档案完成度决定落地页。

use crate::api::{ApiError, use_api};
use crate::components::notify::use_notify;
use crate::session::use_session;
use crate::web::route::{AdminRoute, AppRoute};
use crate::web::router::use_navigate;
use leptos::prelude::*;
use leptos::task::spawn_local;
use topnotes_shared::protocol::VerifyOtpRequest;

/// OTP 输入过滤：只保留数字，最长 6 位
fn sanitize_otp(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).take(6).collect()
}

/// 掩码展示：仅 10 位纯数字手机号打码，其余原样返回
fn mask_phone(phone: &str) -> String {
    if phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}******{}", &phone[..2], &phone[8..])
    } else {
        phone.to_string()
    }
}

#[component]
pub fn VerifyOtpPage() -> impl IntoView {
    let client = use_api();
    let session = use_session();
    let notify = use_notify();
    let navigate = use_navigate();

    let phone = session.otp_phone();

    // 没有待校验的手机号就没有可校验的 OTP，送回发送页
    if phone.is_none() {
        let navigate = navigate.clone();
        Effect::new(move |_| {
            notify.error("Request a new OTP first");
            navigate(AppRoute::SendOtp);
        });
    }

    let (otp, set_otp) = signal(String::new());
    let (submitting, set_submitting) = signal(false);
    let (error, set_error) = signal(Option::<ApiError>::None);

    let on_submit = {
        let navigate = navigate.clone();
        let phone = phone.clone();
        move |ev: leptos::web_sys::SubmitEvent| {
            ev.prevent_default();
            let Some(number) = phone.clone() else {
                return;
            };
            let code = otp.get();
            if code.len() != 6 {
                notify.error("Enter the 6-digit OTP");
                return;
            }

            set_submitting.set(true);
            set_error.set(None);

            let client = client.clone();
            let session = session.clone();
            let navigate = navigate.clone();
            spawn_local(async move {
                match client.mutate(&VerifyOtpRequest::new(number, code)).await {
                    Ok(resp) => {
                        let auth = resp.data;
                        session.establish(&auth.token, &auth.user);
                        session.clear_otp_phone();
                        notify.success("Signed in");
                        // 首次登录先补全档案，老账号直达后台
                        if auth.user.profile_completed {
                            navigate(AppRoute::Admin(AdminRoute::Dashboard));
                        } else {
                            navigate(AppRoute::SetupProfile);
                        }
                    }
                    Err(e) => set_error.set(Some(e)),
                }
                set_submitting.set(false);
            });
        }
    };

    let masked_phone = phone.as_deref().map(mask_phone).unwrap_or_default();

    view! {
        <div class="flex items-center justify-center min-h-screen bg-base-200">
            <div class="card w-full max-w-md shadow-2xl bg-base-100">
                <form class="card-body" on:submit=on_submit>
                    <h2 class="card-title">"Verify OTP"</h2>
                    <p class="text-sm text-base-content/70">
                        "Enter the code sent to " <span class="font-mono">{masked_phone}</span>
                    </p>

                    <Show when=move || error.get().is_some()>
                        <div role="alert" class="alert alert-error text-sm py-2">
                            <span>{move || error.get().unwrap().user_message()}</span>
                        </div>
                    </Show>

                    <div class="form-control">
                        <label class="label" for="otp">
                            <span class="label-text">"One-time password"</span>
                        </label>
                        <input
                            id="otp"
                            type="text"
                            inputmode="numeric"
                            autocomplete="one-time-code"
                            placeholder="123456"
                            class="input input-bordered font-mono tracking-[0.5em] text-center"
                            on:input=move |ev| set_otp.set(sanitize_otp(&event_target_value(&ev)))
                            prop:value=otp
                            required
                        />
                    </div>
                    <div class="form-control mt-4">
                        <button class="btn btn-primary" disabled=move || submitting.get()>
                            {move || if submitting.get() {
                                view! { <span class="loading loading-spinner"></span> "Verifying..." }.into_any()
                            } else {
                                "Verify and sign in".into_any()
                            }}
                        </button>
                    </div>

                    <div class="text-center mt-2">
                        {
                            let navigate = navigate.clone();
                            view! {
                                <a
                                    class="link link-hover text-sm"
                                    on:click=move |_| navigate(AppRoute::SendOtp)
                                >
                                    "Did not receive it? Resend"
                                </a>
                            }
                        }
                    </div>
                </form>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::{mask_phone, sanitize_otp};

    #[test]
    fn otp_filter_keeps_six_digits() {
        assert_eq!(sanitize_otp("12 34 56 78"), "123456");
        assert_eq!(sanitize_otp("1a2b3c"), "123");
    }

    #[test]
    fn masking_only_applies_to_plain_digit_numbers() {
        assert_eq!(mask_phone("9876543210"), "98******10");
        // 恰好 10 字节的多字节串不打码，也绝不截断字符
        assert_eq!(mask_phone("áéíóú"), "áéíóú");
        assert_eq!(mask_phone("98765"), "98765");
    }
}
