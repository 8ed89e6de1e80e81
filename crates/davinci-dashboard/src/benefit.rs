//! 效益分析
//!
//! 按价格表累加每台手术使用的器械和耗材得到成本，
//! 与固定报销金额比较得到差额。

use davinci_core::utils::{format_money, split_multi_value};
use davinci_core::{PriceLookup, Result, SurgeryRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 每台手术的固定报销金额
pub const DEFAULT_REIMBURSEMENT: i64 = 33000;

/// 单台手术的效益
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BenefitRow {
    pub p_name: String,
    pub date: String,
    pub admission_number: String,
    pub department: String,
    pub s_name: String,
    pub chief_surgeon: String,
    pub instruments: String,
    pub consumables: String,
    /// 成本，两位小数
    pub sum: String,
    /// 报销金额
    pub real_sum: i64,
    /// 报销金额 - 成本，两位小数
    pub gap: String,
}

/// 汇总
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BenefitTotals {
    pub total_cost: String,
    pub total_paid: String,
    pub total_gap: String,
}

/// 效益分析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenefitAnalysis {
    pub rows: Vec<BenefitRow>,
    pub totals: BenefitTotals,
}

/// 计算一台手术的成本，任何一个项目缺少价格都会失败
fn surgery_cost(record: &SurgeryRecord, prices: &dyn PriceLookup) -> Result<Decimal> {
    let mut cost = Decimal::ZERO;
    for item in split_multi_value(&record.instruments)
        .iter()
        .chain(split_multi_value(&record.consumables).iter())
    {
        cost += prices.lookup_price(item)?;
    }
    Ok(cost)
}

/// 对一批手术做效益分析
pub fn analyze_benefits(
    records: &[SurgeryRecord],
    prices: &dyn PriceLookup,
    reimbursement: i64,
) -> Result<BenefitAnalysis> {
    let paid = Decimal::from(reimbursement);

    let mut rows = Vec::with_capacity(records.len());
    let mut total_cost = Decimal::ZERO;
    let mut total_paid = Decimal::ZERO;
    let mut total_gap = Decimal::ZERO;

    for record in records {
        let cost = surgery_cost(record, prices).map_err(|e| {
            tracing::error!(
                "Benefit analysis failed for admission {}: {}",
                record.admission_number,
                e
            );
            e
        })?;
        let gap = paid - cost;

        total_cost += cost;
        total_paid += paid;
        total_gap += gap;

        rows.push(BenefitRow {
            p_name: record.patient_name.clone(),
            date: record.date.clone(),
            admission_number: record.admission_number.clone(),
            department: record.department.clone(),
            s_name: record.surgery_name.clone(),
            chief_surgeon: record.chief_surgeon.clone(),
            instruments: record.instruments.clone(),
            consumables: record.consumables.clone(),
            sum: format_money(cost),
            real_sum: reimbursement,
            gap: format_money(gap),
        });
    }

    Ok(BenefitAnalysis {
        rows,
        totals: BenefitTotals {
            total_cost: format_money(total_cost),
            total_paid: format_money(total_paid),
            total_gap: format_money(total_gap),
        },
    })
}
